use crate::chat::title::TitleTask;
use crate::config::Config;
use genie_graph::GraphClient;
use genie_llm::ModelFactory;
use genie_persist::PersistClient;
use std::sync::Arc;

/// Shared application state passed to all handlers.
///
/// Every resource is constructed once at startup and injected; there is no
/// lazy first-call initialization anywhere.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub persist: Arc<PersistClient>,
    pub graph: Arc<GraphClient>,
    pub models: Arc<ModelFactory>,
    pub title_task: Arc<dyn TitleTask>,
}

impl AppState {
    pub fn new(
        config: Config,
        persist: PersistClient,
        graph: GraphClient,
        models: ModelFactory,
    ) -> Self {
        let config = Arc::new(config);
        let persist = Arc::new(persist);
        let models = Arc::new(models);

        let title_task: Arc<dyn TitleTask> = Arc::new(crate::chat::title::LlmTitleTask::new(
            Arc::clone(&persist),
            Arc::clone(&models),
            config.llm.default_provider.clone(),
            config.llm.default_model.clone(),
            config.llm.title_temperature,
        ));

        Self {
            config,
            persist,
            graph: Arc::new(graph),
            models,
            title_task,
        }
    }
}
