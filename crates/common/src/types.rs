use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Log driver that ships container output to CloudWatch Logs.
pub const AWSLOGS_DRIVER: &str = "awslogs";

/// `awslogs` option naming the CloudWatch log group.
pub const AWSLOGS_GROUP_OPTION: &str = "awslogs-group";

/// `awslogs` option naming the log stream prefix.
pub const AWSLOGS_STREAM_PREFIX_OPTION: &str = "awslogs-stream-prefix";

/// An `ECS Task State Change` event as delivered by EventBridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStateChangeEvent {
    /// EventBridge event id
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "detail-type", default)]
    pub detail_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    pub region: String,
    pub detail: TaskDetail,
}

/// The `detail` body of a task state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    pub cluster_arn: String,
    pub task_arn: String,
    pub task_definition_arn: String,
    /// Kept exactly as ECS sent it. Absent when the task never reached
    /// RUNNING (e.g. image pull failure).
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub stopped_at: Option<String>,
    #[serde(default)]
    pub last_status: Option<String>,
    #[serde(default)]
    pub stopped_reason: Option<String>,
    #[serde(default)]
    pub containers: Vec<ContainerResult>,
}

impl TaskDetail {
    /// Whether at least one container exited with a nonzero or missing exit code.
    pub fn has_failures(&self) -> bool {
        self.containers.iter().any(ContainerResult::failed)
    }

    /// Find the result reported for the container with exactly this name.
    pub fn container(&self, name: &str) -> Option<&ContainerResult> {
        self.containers.iter().find(|c| c.name == name)
    }
}

/// Outcome of a single container within a stopped task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerResult {
    pub name: String,
    #[serde(default)]
    pub exit_code: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ContainerResult {
    /// A container that never reported an exit code is treated as failed.
    pub fn failed(&self) -> bool {
        self.exit_code != Some(0)
    }
}

/// Container layout of a task definition, as resolved from ECS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Container definitions in declaration order
    pub containers: Vec<ContainerDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDefinition {
    pub name: String,
    pub log_configuration: Option<LogConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfiguration {
    pub driver: String,
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl LogConfiguration {
    /// CloudWatch group and stream prefix, if this is a complete `awslogs` configuration.
    pub fn awslogs_target(&self) -> Option<(&str, &str)> {
        if self.driver != AWSLOGS_DRIVER {
            return None;
        }
        let group = self.options.get(AWSLOGS_GROUP_OPTION)?;
        let prefix = self.options.get(AWSLOGS_STREAM_PREFIX_OPTION)?;
        Some((group.as_str(), prefix.as_str()))
    }
}

/// A chat message ready for delivery. Serializes to the `chat.postMessage` form body.
#[derive(Clone, Serialize)]
pub struct NotificationMessage {
    pub token: String,
    pub channel: String,
    pub text: String,
}

impl std::fmt::Debug for NotificationMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationMessage")
            .field("token", &"<redacted>")
            .field("channel", &self.channel)
            .field("text", &self.text)
            .finish()
    }
}

/// Acknowledgement returned by the chat service for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub channel: String,
    /// Slack message timestamp, which doubles as the message id
    pub ts: Option<String>,
}

/// What a single invocation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Every container exited cleanly; nothing was sent.
    NoFailures,
    Notified(DeliveryReceipt),
}

/// Event timestamp as reported, or `N/A` when absent. No parsing is attempted.
pub fn format_timestamp(ts: Option<&str>) -> &str {
    ts.unwrap_or("N/A")
}

#[cfg(test)]
mod tests {
    use super::*;

    const STOPPED_EVENT: &str = r#"{
        "version": "0",
        "id": "3317b2af-7005-947d-b652-f55e762e571a",
        "detail-type": "ECS Task State Change",
        "source": "aws.ecs",
        "account": "111122223333",
        "time": "2020-01-23T17:57:58Z",
        "region": "us-west-2",
        "resources": [
            "arn:aws:ecs:us-west-2:111122223333:task/FargateCluster/c13b4cb40f1f4fe4a2971f76ae5a47ad"
        ],
        "detail": {
            "clusterArn": "arn:aws:ecs:us-west-2:111122223333:cluster/FargateCluster",
            "containers": [
                {
                    "containerArn": "arn:aws:ecs:us-west-2:111122223333:container/cf159fd6-3e3f-4a9e-84f9-66cbe726af01",
                    "exitCode": 1,
                    "lastStatus": "STOPPED",
                    "name": "FargateApp",
                    "taskArn": "arn:aws:ecs:us-west-2:111122223333:task/FargateCluster/c13b4cb40f1f4fe4a2971f76ae5a47ad"
                },
                {
                    "containerArn": "arn:aws:ecs:us-west-2:111122223333:container/0e6d5a9e-c00a-4d2c-9d1b-21f1a44d6f07",
                    "lastStatus": "STOPPED",
                    "name": "Sidecar",
                    "reason": "CannotPullContainerError"
                }
            ],
            "lastStatus": "STOPPED",
            "startedAt": "2020-01-23T17:57:38.41Z",
            "stoppedAt": "2020-01-23T17:57:58.103Z",
            "stoppedReason": "Essential container in task exited",
            "taskArn": "arn:aws:ecs:us-west-2:111122223333:task/FargateCluster/c13b4cb40f1f4fe4a2971f76ae5a47ad",
            "taskDefinitionArn": "arn:aws:ecs:us-west-2:111122223333:task-definition/sample:1"
        }
    }"#;

    #[test]
    fn test_deserialize_stopped_event() {
        let event: TaskStateChangeEvent = serde_json::from_str(STOPPED_EVENT).unwrap();
        assert_eq!(event.region, "us-west-2");
        assert_eq!(event.detail_type.as_deref(), Some("ECS Task State Change"));
        assert_eq!(event.detail.containers.len(), 2);
        assert_eq!(event.detail.containers[0].exit_code, Some(1));
        assert_eq!(event.detail.containers[1].exit_code, None);
        assert_eq!(
            event.detail.containers[1].reason.as_deref(),
            Some("CannotPullContainerError")
        );
        assert_eq!(event.detail.last_status.as_deref(), Some("STOPPED"));
        assert!(event.detail.has_failures());
    }

    #[test]
    fn test_timestamps_render_verbatim() {
        let event: TaskStateChangeEvent = serde_json::from_str(STOPPED_EVENT).unwrap();
        assert_eq!(
            format_timestamp(event.detail.started_at.as_deref()),
            "2020-01-23T17:57:38.41Z"
        );
        assert_eq!(
            format_timestamp(event.detail.stopped_at.as_deref()),
            "2020-01-23T17:57:58.103Z"
        );
        assert_eq!(format_timestamp(None), "N/A");
    }

    #[test]
    fn test_offset_and_garbled_timestamps_still_deserialize() {
        let event: TaskStateChangeEvent = serde_json::from_str(
            &STOPPED_EVENT
                .replace("2020-01-23T17:57:38.41Z", "2024-01-01T09:00:00.123456789+09:00")
                .replace("2020-01-23T17:57:58.103Z", "2024-01-01 00:00"),
        )
        .unwrap();
        assert_eq!(
            format_timestamp(event.detail.started_at.as_deref()),
            "2024-01-01T09:00:00.123456789+09:00"
        );
        assert_eq!(
            format_timestamp(event.detail.stopped_at.as_deref()),
            "2024-01-01 00:00"
        );
    }

    #[test]
    fn test_has_failures() {
        let detail = |codes: Vec<Option<i64>>| TaskDetail {
            cluster_arn: String::new(),
            task_arn: String::new(),
            task_definition_arn: String::new(),
            started_at: None,
            stopped_at: None,
            last_status: None,
            stopped_reason: None,
            containers: codes
                .into_iter()
                .enumerate()
                .map(|(i, exit_code)| ContainerResult {
                    name: format!("c{}", i),
                    exit_code,
                    reason: None,
                })
                .collect(),
        };

        assert!(!detail(vec![]).has_failures());
        assert!(!detail(vec![Some(0), Some(0)]).has_failures());
        assert!(detail(vec![Some(0), Some(137)]).has_failures());
        assert!(detail(vec![None]).has_failures());
    }

    #[test]
    fn test_awslogs_target() {
        let mut options = HashMap::new();
        options.insert(AWSLOGS_GROUP_OPTION.to_string(), "/ecs/g".to_string());
        options.insert(AWSLOGS_STREAM_PREFIX_OPTION.to_string(), "svc".to_string());
        let config = LogConfiguration {
            driver: AWSLOGS_DRIVER.to_string(),
            options: options.clone(),
        };
        assert_eq!(config.awslogs_target(), Some(("/ecs/g", "svc")));

        let splunk = LogConfiguration {
            driver: "splunk".to_string(),
            options,
        };
        assert_eq!(splunk.awslogs_target(), None);

        let incomplete = LogConfiguration {
            driver: AWSLOGS_DRIVER.to_string(),
            options: HashMap::new(),
        };
        assert_eq!(incomplete.awslogs_target(), None);
    }

    #[test]
    fn test_message_debug_redacts_token() {
        let message = NotificationMessage {
            token: "xoxb-secret".to_string(),
            channel: "C123".to_string(),
            text: "hello".to_string(),
        };
        let debug = format!("{:?}", message);
        assert!(!debug.contains("xoxb-secret"));
        assert!(debug.contains("C123"));
    }
}
