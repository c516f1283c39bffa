use serde::Deserialize;

use crate::dataselect::DataSelectQuery;

#[derive(Debug, Clone, Deserialize)]
pub struct GetListArgs {
    pub kind: String,
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(flatten)]
    pub query: DataSelectQuery,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetReleaseDetailArgs {
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryArgs {
    pub repo_name: String,
}
