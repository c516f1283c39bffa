mod deploy;
mod repo;
mod repository;

pub use deploy::{
    deploy_chart, deploy_chart_response, AppDeploymentFromChartResponse,
    AppDeploymentFromChartSpec, ChartRef, ReleaseInstaller,
};
pub use repo::{ensure_home, RepoPaths};
pub use repository::{
    add_repository, get_repository_charts, get_repository_list, remove_repository, ChartSpec,
    RepositoryChartListSpec, RepositoryListSpec, RepositoryManager, RepositorySpec,
};
