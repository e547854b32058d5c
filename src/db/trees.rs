use crate::db::models::{Tree, TreeInput, TreeType};
use crate::db::operations::DbOperations;
use crate::error::{AppError, DatabaseError};

const TREE_COLUMNS: &str = "t.id, t.name, t.hardness_factor, t.hardwood, t.type_id, types.type, t.owner_id";

fn map_write_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_foreign_key_violation() {
            return AppError::ValidationError("type_id does not reference a known type".to_string());
        }
    }
    DatabaseError::from(err).into()
}

impl DbOperations {
    pub async fn list_types(&self) -> Result<Vec<TreeType>, AppError> {
        let types = sqlx::query_as::<_, TreeType>("SELECT id, type FROM types ORDER BY id")
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(types)
    }

    pub async fn list_trees(&self) -> Result<Vec<Tree>, AppError> {
        let query = format!(
            "SELECT {} FROM trees t JOIN types ON types.id = t.type_id ORDER BY t.id",
            TREE_COLUMNS
        );
        let trees = sqlx::query_as::<_, Tree>(&query)
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(trees)
    }

    pub async fn get_tree(&self, id: i64) -> Result<Option<Tree>, AppError> {
        let query = format!(
            "SELECT {} FROM trees t JOIN types ON types.id = t.type_id WHERE t.id = $1",
            TREE_COLUMNS
        );
        let tree = sqlx::query_as::<_, Tree>(&query)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(tree)
    }

    pub async fn create_tree(&self, owner_id: i64, input: &TreeInput) -> Result<Tree, AppError> {
        let query = format!(
            r#"
            WITH t AS (
                INSERT INTO trees (name, hardness_factor, hardwood, type_id, owner_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT {} FROM t JOIN types ON types.id = t.type_id
            "#,
            TREE_COLUMNS
        );
        sqlx::query_as::<_, Tree>(&query)
            .bind(&input.name)
            .bind(input.hardness_factor)
            .bind(input.hardwood)
            .bind(input.type_id)
            .bind(owner_id)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(map_write_error)
    }

    /// Updates a tree owned by `owner_id`; `None` when no such tree exists.
    pub async fn update_tree(
        &self,
        id: i64,
        owner_id: i64,
        input: &TreeInput,
    ) -> Result<Option<Tree>, AppError> {
        let query = format!(
            r#"
            WITH t AS (
                UPDATE trees
                SET name = $1, hardness_factor = $2, hardwood = $3, type_id = $4
                WHERE id = $5 AND owner_id = $6
                RETURNING *
            )
            SELECT {} FROM t JOIN types ON types.id = t.type_id
            "#,
            TREE_COLUMNS
        );
        sqlx::query_as::<_, Tree>(&query)
            .bind(&input.name)
            .bind(input.hardness_factor)
            .bind(input.hardwood)
            .bind(input.type_id)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(map_write_error)
    }

    pub async fn delete_tree(&self, id: i64, owner_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM trees WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
