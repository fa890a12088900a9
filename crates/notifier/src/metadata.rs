//! Task definition lookup.
//!
//! The handler only needs each container's name and log configuration, so the
//! ECS response is narrowed to [`TaskDefinition`] at this boundary.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ecs::config::Region;
use aws_sdk_ecs::error::DisplayErrorContext;

use stopwatch_common::error::HandlerError;
use stopwatch_common::types::{ContainerDefinition, LogConfiguration, TaskDefinition};

/// Resolves a task-definition ARN to its container layout.
#[async_trait]
pub trait TaskDefinitionSource: Send + Sync {
    async fn describe(
        &self,
        region: &str,
        task_definition_arn: &str,
    ) -> Result<TaskDefinition, HandlerError>;
}

/// [`TaskDefinitionSource`] backed by ECS `DescribeTaskDefinition`.
pub struct EcsTaskDefinitions {
    sdk_config: SdkConfig,
}

impl EcsTaskDefinitions {
    pub fn new(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }

    /// ECS client pinned to the region the event came from.
    fn client(&self, region: &str) -> aws_sdk_ecs::Client {
        let config = aws_sdk_ecs::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_ecs::Client::from_conf(config)
    }
}

#[async_trait]
impl TaskDefinitionSource for EcsTaskDefinitions {
    async fn describe(
        &self,
        region: &str,
        task_definition_arn: &str,
    ) -> Result<TaskDefinition, HandlerError> {
        let output = self
            .client(region)
            .describe_task_definition()
            .task_definition(task_definition_arn)
            .send()
            .await
            .map_err(|e| {
                HandlerError::MetadataFetch(format!(
                    "DescribeTaskDefinition failed for {}: {}",
                    task_definition_arn,
                    DisplayErrorContext(&e)
                ))
            })?;

        let definition = output.task_definition().ok_or_else(|| {
            HandlerError::MetadataFetch(format!(
                "no task definition returned for {}",
                task_definition_arn
            ))
        })?;

        let definition = from_sdk(definition);
        tracing::debug!(
            task_definition_arn,
            containers = definition.containers.len(),
            "Resolved task definition"
        );
        Ok(definition)
    }
}

/// Narrow an SDK task definition to the fields the report uses.
pub fn from_sdk(definition: &aws_sdk_ecs::types::TaskDefinition) -> TaskDefinition {
    let containers = definition
        .container_definitions()
        .iter()
        .map(|container| ContainerDefinition {
            name: container.name().unwrap_or_default().to_string(),
            log_configuration: container.log_configuration().map(|log| LogConfiguration {
                driver: log.log_driver().as_str().to_string(),
                options: log.options().cloned().unwrap_or_default(),
            }),
        })
        .collect();

    TaskDefinition { containers }
}
