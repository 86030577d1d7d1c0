//! Builds stage implementations and pipelines from configuration

use crate::config::{FileConfig, FileStageConfig, StageKind};
use crate::extraction::CommandExtractor;
use crate::stages::CommandStage;
use loanflow_application::ports::loan_store::LoanStorePort;
use loanflow_application::ports::progress::BatchProgressNotifier;
use loanflow_application::ports::stage::Stage;
use loanflow_application::{
    ConsistencyStage, Pipeline, SampleConsistencyUseCase, SummarizeStage, SummarizeUseCase,
};
use loanflow_domain::{ArtifactRequirement, DomainError, PipelineDefinition};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unknown pipeline '{0}'")]
    UnknownPipeline(String),

    #[error("Pipeline '{pipeline}' references unknown stage '{stage}'")]
    UnknownStage { pipeline: String, stage: String },

    #[error("Stage '{0}' is an http stage but http support is not compiled in")]
    HttpUnavailable(String),

    #[error("Stage '{0}' is an http stage without a url")]
    MissingUrl(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Every configured stage, instantiated once and shared by all pipelines.
pub struct StageRegistry {
    stages: Vec<Arc<dyn Stage>>,
    configs: Vec<FileStageConfig>,
    pipelines: BTreeMap<String, Vec<String>>,
    requirements: BTreeMap<String, Vec<String>>,
}

impl StageRegistry {
    /// `store` backs the in-process stages; `progress` receives sampling runs.
    pub fn from_config(
        config: &FileConfig,
        store: Arc<dyn LoanStorePort>,
        progress: Arc<dyn BatchProgressNotifier>,
    ) -> Result<Self, RegistryError> {
        let stages = config
            .stages
            .iter()
            .map(|stage| build_stage(stage, config, &store, &progress))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Registered {} stages", stages.len());

        Ok(Self {
            stages,
            configs: config.stages.clone(),
            pipelines: config
                .pipelines
                .iter()
                .map(|(name, p)| (name.clone(), p.stages.clone()))
                .collect(),
            requirements: config
                .pipelines
                .iter()
                .map(|(name, p)| (name.clone(), p.requires.clone()))
                .collect(),
        })
    }

    pub fn stages(&self) -> &[Arc<dyn Stage>] {
        &self.stages
    }

    pub fn pipeline_names(&self) -> impl Iterator<Item = &str> {
        self.pipelines.keys().map(String::as_str)
    }

    pub fn definition(&self, name: &str) -> Result<PipelineDefinition, RegistryError> {
        let stage_names = self
            .pipelines
            .get(name)
            .ok_or_else(|| RegistryError::UnknownPipeline(name.to_string()))?;

        let specs = stage_names
            .iter()
            .map(|stage| {
                self.configs
                    .iter()
                    .find(|c| &c.name == stage)
                    .map(FileStageConfig::to_spec)
                    .ok_or_else(|| RegistryError::UnknownStage {
                        pipeline: name.to_string(),
                        stage: stage.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let requires = self.requirements.get(name).cloned().unwrap_or_default();
        Ok(PipelineDefinition::new(name, specs)?
            .with_requirement(ArtifactRequirement::new(requires)))
    }

    pub fn pipeline(&self, name: &str) -> Result<Pipeline, RegistryError> {
        Ok(Pipeline::new(self.definition(name)?, &self.stages)?)
    }
}

fn build_stage(
    stage: &FileStageConfig,
    config: &FileConfig,
    store: &Arc<dyn LoanStorePort>,
    progress: &Arc<dyn BatchProgressNotifier>,
) -> Result<Arc<dyn Stage>, RegistryError> {
    let built: Arc<dyn Stage> = match stage.kind {
        StageKind::Command => Arc::new(CommandStage::from_config(stage)),
        StageKind::Consistency => {
            let extractor = Arc::new(CommandExtractor::from_config(&config.extractor));
            let sampler =
                SampleConsistencyUseCase::new(extractor, config.extractor.to_sampling_params())
                    .with_store(Arc::clone(store))
                    .with_progress(Arc::clone(progress));
            Arc::new(ConsistencyStage::new(&stage.name, sampler))
        }
        StageKind::Summarize => {
            let summarizer =
                SummarizeUseCase::new(Arc::clone(store), config.extractor.to_sampling_params());
            Arc::new(SummarizeStage::new(&stage.name, summarizer))
        }
        StageKind::Http => return http_stage(stage),
    };
    Ok(built)
}

#[cfg(feature = "http-stage")]
fn http_stage(stage: &FileStageConfig) -> Result<Arc<dyn Stage>, RegistryError> {
    let url = stage
        .url
        .clone()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| RegistryError::MissingUrl(stage.name.clone()))?;
    Ok(Arc::new(crate::stages::HttpStage::new(&stage.name, url)))
}

#[cfg(not(feature = "http-stage"))]
fn http_stage(stage: &FileStageConfig) -> Result<Arc<dyn Stage>, RegistryError> {
    Err(RegistryError::HttpUnavailable(stage.name.clone()))
}
