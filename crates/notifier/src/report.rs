//! Failure report construction.
//!
//! Turns a stopped-task event plus its task definition into the Slack message
//! text: a header with the task-definition ARN, run window and console link,
//! followed by one fenced block per container in task-definition order.

use stopwatch_common::error::HandlerError;
use stopwatch_common::types::{
    AWSLOGS_DRIVER, ContainerDefinition, ContainerResult, TaskDefinition, TaskStateChangeEvent,
    format_timestamp,
};

/// Short resource name from an ARN: everything after the last `/`.
///
/// For single-slash ARNs (`cluster/<name>`, `task/<id>`) this is the text after
/// the first `/`. Long-format task ARNs (`task/<cluster>/<id>`) deliberately
/// yield the trailing task id, which is what the console URL and the awslogs
/// stream name expect. Returns the input unchanged when it contains no `/`.
pub fn short_name(arn: &str) -> &str {
    arn.rsplit_once('/').map(|(_, name)| name).unwrap_or(arn)
}

/// ECS console page for a single task.
pub fn task_detail_url(region: &str, cluster: &str, task_id: &str) -> String {
    format!(
        "https://{region}.console.aws.amazon.com/ecs/home?region={region}#/clusters/{cluster}/tasks/{task_id}/details"
    )
}

/// CloudWatch console page for one log stream.
///
/// Group and stream are percent-encoded with every non-unreserved character
/// escaped, so `!'()*` are encoded too; the console decodes either form.
pub fn log_stream_url(region: &str, group: &str, stream: &str) -> String {
    format!(
        "https://{region}.console.aws.amazon.com/cloudwatch/home?region={region}#logsV2:log-groups/log-group/{}/log-events/{}",
        urlencoding::encode(group),
        urlencoding::encode(stream)
    )
}

/// Build the report text for a failed task.
///
/// Every container definition must have a matching result in the event and
/// vice versa; a mismatch means the event and definition disagree and is
/// reported as [`HandlerError::ContainerMatch`].
pub fn build_report(
    event: &TaskStateChangeEvent,
    definition: &TaskDefinition,
) -> Result<String, HandlerError> {
    check_results_are_defined(event, definition)?;

    let detail = &event.detail;
    let cluster = short_name(&detail.cluster_arn);
    let task_id = short_name(&detail.task_arn);

    let mut text = format!(
        "Task is STOPPED : {}\nRunning at: {} - {}\nDetail: {}\n",
        detail.task_definition_arn,
        format_timestamp(detail.started_at.as_deref()),
        format_timestamp(detail.stopped_at.as_deref()),
        task_detail_url(&event.region, cluster, task_id),
    );
    if let Some(reason) = &detail.stopped_reason {
        text.push_str(&format!("Reason: {}\n", reason));
    }

    for container in &definition.containers {
        let result = detail.container(&container.name).ok_or_else(|| {
            HandlerError::ContainerMatch(format!(
                "container '{}' from {} has no result in the event",
                container.name, detail.task_definition_arn
            ))
        })?;
        text.push_str(&container_block(&event.region, task_id, container, result));
    }

    Ok(text)
}

/// Reject events that report containers the task definition does not declare.
fn check_results_are_defined(
    event: &TaskStateChangeEvent,
    definition: &TaskDefinition,
) -> Result<(), HandlerError> {
    for result in &event.detail.containers {
        if !definition.containers.iter().any(|c| c.name == result.name) {
            return Err(HandlerError::ContainerMatch(format!(
                "container '{}' is not declared in {}",
                result.name, event.detail.task_definition_arn
            )));
        }
    }
    Ok(())
}

fn container_block(
    region: &str,
    task_id: &str,
    container: &ContainerDefinition,
    result: &ContainerResult,
) -> String {
    let exit_code = result
        .exit_code
        .map(|code| code.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    let mut block = format!(
        "```\nContainer: {}\nExitCode: {}\n",
        container.name, exit_code
    );
    if let Some(reason) = &result.reason {
        block.push_str(&format!("Reason: {}\n", reason));
    }

    if let Some(log_config) = &container.log_configuration {
        match log_config.awslogs_target() {
            Some((group, prefix)) => {
                let stream = format!("{}/{}/{}", prefix, container.name, task_id);
                block.push_str(&format!(
                    "LogURL: {}\n",
                    log_stream_url(region, group, &stream)
                ));
            }
            None if log_config.driver == AWSLOGS_DRIVER => {
                tracing::warn!(
                    container = %container.name,
                    "awslogs driver without group or stream prefix, omitting log link"
                );
            }
            None => {}
        }
    }

    block.push_str("```\n");
    block
}
