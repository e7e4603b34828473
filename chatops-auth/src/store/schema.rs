//! Arrow/Delta schema for the `accounts` table
//!
//! Column order is fixed; [`crate::store::delta`] addresses columns by the
//! index constants below.

use std::sync::Arc;

use deltalake::arrow::array::{ArrayRef, RecordBatch, StringArray};
use deltalake::arrow::datatypes::{DataType, Field, Schema};
use deltalake::kernel::{DataType as DeltaDataType, PrimitiveType, StructField};

use crate::error::Result;
use crate::identity::Account;

pub const TABLE_ACCOUNTS: &str = "accounts";

/// Key column name, used in lookup and delete predicates
pub const ACCOUNT_ID: &str = "account_id";

pub const COL_ACCOUNT_ID: usize = 0;
pub const COL_NAME: usize = 1;
pub const COL_EMAIL: usize = 2;
pub const COL_AWS_ACCESS_KEY: usize = 3;
pub const COL_AWS_SECRET_KEY: usize = 4;
pub const COL_AWS_REGION: usize = 5;
pub const COL_CREATED_AT: usize = 6;

/// Arrow schema for the `accounts` Delta table
pub fn accounts_arrow_schema() -> Schema {
    Schema::new(vec![
        Field::new(ACCOUNT_ID, DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("email", DataType::Utf8, false),
        Field::new("aws_access_key", DataType::Utf8, true),
        Field::new("aws_secret_key", DataType::Utf8, true),
        Field::new("aws_region", DataType::Utf8, true),
        Field::new("created_at", DataType::Utf8, false),
    ])
}

/// Delta StructFields for `accounts` table creation
pub fn accounts_delta_fields() -> Vec<StructField> {
    let string = || DeltaDataType::Primitive(PrimitiveType::String);
    vec![
        StructField::new(ACCOUNT_ID, string(), false),
        StructField::new("name", string(), false),
        StructField::new("email", string(), false),
        StructField::new("aws_access_key", string(), true),
        StructField::new("aws_secret_key", string(), true),
        StructField::new("aws_region", string(), true),
        StructField::new("created_at", string(), false),
    ]
}

/// Single-row batch for one account
pub fn account_batch(account: &Account) -> Result<RecordBatch> {
    let creds = account.aws_credentials.as_ref();
    let batch = RecordBatch::try_new(
        Arc::new(accounts_arrow_schema()),
        vec![
            Arc::new(StringArray::from(vec![account.id.as_str()])) as ArrayRef,
            Arc::new(StringArray::from(vec![account.name.as_str()])),
            Arc::new(StringArray::from(vec![account.email.as_str()])),
            Arc::new(StringArray::from(vec![creds.and_then(|c| c.access_key.as_deref())])),
            Arc::new(StringArray::from(vec![creds.and_then(|c| c.secret_key.as_deref())])),
            Arc::new(StringArray::from(vec![creds.and_then(|c| c.region.as_deref())])),
            Arc::new(StringArray::from(vec![account.created_at.as_str()])),
        ],
    )?;
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltalake::arrow::array::Array;

    #[test]
    fn test_schema_matches_delta_fields() {
        let arrow = accounts_arrow_schema();
        let delta = accounts_delta_fields();
        assert_eq!(arrow.fields().len(), delta.len());
        assert_eq!(arrow.field(COL_AWS_REGION).name(), "aws_region");
        assert_eq!(arrow.field(COL_CREATED_AT).name(), "created_at");
    }

    #[test]
    fn test_account_batch_nulls_for_missing_credentials() {
        let batch = account_batch(&Account::new("u1", "Alice", "a@e.com")).unwrap();
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.column(COL_AWS_ACCESS_KEY).null_count(), 1);
        assert_eq!(batch.column(COL_NAME).null_count(), 0);
    }
}
