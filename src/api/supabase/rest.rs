//! [`TaskTable`] over the REST interface of the `tasks` table.

use super::{rejection, SupabaseClient};
use crate::api::{DeleteOutcome, NewTaskRow, RemoteError, TaskPatch, TaskQuery, TaskSort, TaskTable};
use crate::libs::task::{Task, TaskId, UserId};
use reqwest::Response;
use url::Url;

const TASKS: &str = "rest/v1/tasks";
const RETURN_ROWS: (&str, &str) = ("Prefer", "return=representation");

/// Query string for a partition read.
pub(crate) fn select_params(query: &TaskQuery) -> Vec<(&'static str, String)> {
    let order = match query.sort {
        TaskSort::ManualAscending => "order.asc.nullslast,created_at.asc",
        TaskSort::NewestFirst => "created_at.desc",
    };
    vec![
        ("select", "*".to_string()),
        ("user_id", format!("eq.{}", query.owner)),
        ("featured", format!("eq.{}", query.featured)),
        ("order", order.to_string()),
    ]
}

/// Filter addressing exactly one row of one owner.
pub(crate) fn row_params(owner: &UserId, id: &TaskId) -> Vec<(&'static str, String)> {
    vec![("id", format!("eq.{}", id)), ("user_id", format!("eq.{}", owner))]
}

fn with_params(mut url: Url, params: &[(&str, String)]) -> Url {
    url.query_pairs_mut().extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
    url
}

async fn rows(response: Response) -> Result<Vec<Task>, RemoteError> {
    if !response.status().is_success() {
        return Err(rejection(response).await);
    }
    response.json().await.map_err(|e| RemoteError::Decode(e.to_string()))
}

impl TaskTable for SupabaseClient {
    async fn select(&self, query: &TaskQuery) -> Result<Vec<Task>, RemoteError> {
        let url = with_params(self.endpoint(TASKS)?, &select_params(query));
        tracing::debug!(owner = %query.owner, featured = query.featured, "select tasks");
        let response = self
            .send_authorized(|token| self.request(self.http().get(url.clone()), Some(token)))
            .await?;
        rows(response).await
    }

    async fn insert(&self, row: &NewTaskRow) -> Result<Task, RemoteError> {
        let url = self.endpoint(TASKS)?;
        tracing::debug!(owner = %row.user_id, "insert task");
        let response = self
            .send_authorized(|token| {
                self.request(self.http().post(url.clone()), Some(token))
                    .header(RETURN_ROWS.0, RETURN_ROWS.1)
                    .json(row)
            })
            .await?;
        rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::Decode("insert returned no row".to_string()))
    }

    async fn update(&self, owner: &UserId, id: &TaskId, patch: &TaskPatch) -> Result<Task, RemoteError> {
        let url = with_params(self.endpoint(TASKS)?, &row_params(owner, id));
        tracing::debug!(%owner, task = %id, "update task");
        let response = self
            .send_authorized(|token| {
                self.request(self.http().patch(url.clone()), Some(token))
                    .header(RETURN_ROWS.0, RETURN_ROWS.1)
                    .json(patch)
            })
            .await?;
        rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::NotFound(format!("task {}", id)))
    }

    async fn delete(&self, owner: &UserId, id: &TaskId) -> Result<DeleteOutcome, RemoteError> {
        let url = with_params(self.endpoint(TASKS)?, &row_params(owner, id));
        tracing::debug!(%owner, task = %id, "delete task");
        let response = self
            .send_authorized(|token| {
                self.request(self.http().delete(url.clone()), Some(token))
                    .header(RETURN_ROWS.0, RETURN_ROWS.1)
            })
            .await?;
        let deleted = rows(response).await?;
        Ok(if deleted.is_empty() {
            DeleteOutcome::AlreadyGone
        } else {
            DeleteOutcome::Deleted
        })
    }
}
