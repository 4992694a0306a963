//! Normalization of flow content.
//!
//! Account number, partition, region and instance id are replaced with
//! CloudFormation pseudo parameters, and identifiers of prompts and queues
//! that come with every instance are mapped to their destination ids.
use std::collections::BTreeMap;

use snafu::prelude::*;

use crate::{
    rewrite::SpanEdits, trailing_id, ContentParseSnafu, InstanceArnSnafu, Manifest,
    ManifestCategory, OverlappingSubstitutionSnafu, Result, SymbolicName, UnmappedPromptSnafu,
    UnmappedQueueSnafu,
};

pub const ACCOUNT_ID: &str = "${AWS::AccountId}";
pub const PARTITION: &str = "${AWS::Partition}";
pub const REGION: &str = "${AWS::Region}";
pub const INSTANCE_ID: &str = "${ConnectInstanceID}";

/// The source identifiers that get replaced by pseudo parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Substitutions {
    account_number: String,
    partition: String,
    region: String,
    instance_id: String,
}

impl Substitutions {
    /// Creates the substitutions, ensuring that no identifier occurs inside
    /// another one.
    pub fn new(
        account_number: impl Into<String>,
        partition: impl Into<String>,
        region: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Result<Self> {
        let substitutions = Self {
            account_number: account_number.into(),
            partition: partition.into(),
            region: region.into(),
            instance_id: instance_id.into(),
        };
        let literals = substitutions.pairs().map(|(literal, _)| literal);
        for (i, inner) in literals.iter().enumerate() {
            for (j, outer) in literals.iter().enumerate() {
                snafu::ensure!(
                    i == j || !outer.contains(inner),
                    OverlappingSubstitutionSnafu {
                        inner: *inner,
                        outer: *outer
                    }
                );
            }
        }
        Ok(substitutions)
    }

    fn pairs(&self) -> [(&str, &'static str); 4] {
        [
            (self.account_number.as_str(), ACCOUNT_ID),
            (self.partition.as_str(), PARTITION),
            (self.region.as_str(), REGION),
            (self.instance_id.as_str(), INSTANCE_ID),
        ]
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Replaces every literal occurrence of each identifier.
    pub fn apply(&self, content: &str) -> String {
        self.pairs()
            .into_iter()
            .fold(content.to_owned(), |content, (literal, placeholder)| {
                if literal.is_empty() {
                    content
                } else {
                    content.replace(literal, placeholder)
                }
            })
    }
}

/// Everything known about the source instance before fetching starts.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceIdentity {
    pub substitutions: Substitutions,
    pub instance_arn: String,
}

impl SourceIdentity {
    /// Builds the identity from the caller's account number and the source
    /// instance ARN, `arn:<partition>:connect:<region>:<account>:instance/<id>`.
    pub fn new(
        account_number: impl Into<String>,
        instance_id: impl Into<String>,
        instance_arn: impl Into<String>,
    ) -> Result<Self> {
        let instance_arn = instance_arn.into();
        let fields = instance_arn.split(':').collect::<Vec<_>>();
        snafu::ensure!(
            fields.len() >= 6 && fields[0] == "arn",
            InstanceArnSnafu { arn: &instance_arn }
        );
        let substitutions =
            Substitutions::new(account_number, fields[1], fields[3], instance_id)?;
        Ok(Self {
            substitutions,
            instance_arn,
        })
    }

    /// The instance ARN with its identifiers replaced by pseudo parameters.
    pub fn normalized_instance_arn(&self) -> String {
        self.substitutions.apply(&self.instance_arn)
    }
}

fn text_field<'v>(value: &'v serde_json::Value, field: &str) -> Option<&'v str> {
    value.get(field).and_then(serde_json::Value::as_str)
}

/// Normalizes the content of fetched resources.
pub struct Normalizer<'a> {
    substitutions: &'a Substitutions,
    manifest: &'a Manifest,
    phone_numbers: &'a BTreeMap<String, String>,
}

impl<'a> Normalizer<'a> {
    pub fn new(
        substitutions: &'a Substitutions,
        manifest: &'a Manifest,
        phone_numbers: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            substitutions,
            manifest,
            phone_numbers,
        }
    }

    /// Normalizes the `Content` of `resource`.
    ///
    /// Pseudo parameters are substituted first, then phone numbers, then
    /// prompt and queue ids. A prompt or queue that has no entry in the
    /// manifest is an error.
    pub fn normalize(&self, resource: &SymbolicName, content: &str) -> Result<String> {
        let content = self.substitutions.apply(content);
        let content = self.map_phone_numbers(&content);
        let content = self.map_prompts_and_queues(resource, content)?;
        log::trace!("normalized {resource}:\n{content}");
        Ok(content)
    }

    fn map_phone_numbers(&self, content: &str) -> String {
        let mut edits = SpanEdits::new(content);
        for (source, target) in self.phone_numbers {
            edits.replace_all(source, target);
        }
        edits.apply()
    }

    fn map_prompts_and_queues(&self, resource: &SymbolicName, content: String) -> Result<String> {
        let flow: serde_json::Value =
            serde_json::from_str(&content).context(ContentParseSnafu {
                resource: resource.clone(),
            })?;
        let Some(actions) = flow
            .pointer("/Metadata/ActionMetadata")
            .and_then(serde_json::Value::as_object)
        else {
            return Ok(content);
        };

        let mut edits = SpanEdits::new(&content);
        for action in actions.values() {
            let prompts = action
                .get("audio")
                .and_then(serde_json::Value::as_array)
                .into_iter()
                .flatten()
                .filter(|audio| text_field(audio, "type") == Some("Prompt"));
            for audio in prompts {
                let Some(source_id) = text_field(audio, "id").map(trailing_id) else {
                    continue;
                };
                let text = text_field(audio, "text").unwrap_or(source_id);
                let dest_id = self
                    .destination_id(ManifestCategory::Prompts, text)
                    .context(UnmappedPromptSnafu {
                        prompt: text,
                        resource: resource.clone(),
                    })?;
                log::debug!("{resource}: prompt '{text}' {source_id} -> {dest_id}");
                edits.replace_all(source_id, dest_id);
            }

            let Some(queue) = action.get("queue") else {
                continue;
            };
            let Some(source_id) = text_field(queue, "id").map(trailing_id) else {
                continue;
            };
            let text = text_field(queue, "text").unwrap_or(source_id);
            let dest_id = self
                .destination_id(ManifestCategory::Queues, text)
                .context(UnmappedQueueSnafu {
                    queue: text,
                    resource: resource.clone(),
                })?;
            log::debug!("{resource}: queue '{text}' {source_id} -> {dest_id}");
            edits.replace_all(source_id, dest_id);
        }

        Ok(edits.apply())
    }

    fn destination_id(&self, category: ManifestCategory, name: &str) -> Option<&'a str> {
        self.manifest
            .lookup(category, name)
            .and_then(|entry| entry.id.as_deref())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{ManifestEntry, ResourceKind};

    const INSTANCE: &str = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";

    fn identity() -> SourceIdentity {
        SourceIdentity::new(
            "123456789012",
            INSTANCE,
            format!("arn:aws:connect:us-east-1:123456789012:instance/{INSTANCE}"),
        )
        .unwrap()
    }

    /// ARN of a resource of the source instance.
    fn source_arn(resource: &str) -> String {
        format!("arn:aws:connect:us-east-1:123456789012:instance/{INSTANCE}/{resource}")
    }

    fn symbol() -> SymbolicName {
        SymbolicName::derive(ResourceKind::Flow, "Main").unwrap()
    }

    fn manifest() -> Manifest {
        let mut manifest = Manifest::default();
        manifest.insert(
            ManifestCategory::Prompts,
            "Beep.wav",
            ManifestEntry {
                arn: None,
                id: Some("dest-prompt".into()),
            },
        );
        manifest.insert(
            ManifestCategory::Queues,
            "BasicQueue",
            ManifestEntry {
                arn: None,
                id: Some("dest-queue".into()),
            },
        );
        manifest
    }

    #[test]
    fn identity_from_instance_arn() {
        let identity = identity();
        assert_eq!(
            "arn:${AWS::Partition}:connect:${AWS::Region}:${AWS::AccountId}\
            :instance/${ConnectInstanceID}",
            identity.normalized_instance_arn()
        );
        assert!(SourceIdentity::new("1", "i", "not-an-arn").is_err());
    }

    #[test]
    fn overlapping_identifiers_are_rejected() {
        let result = Substitutions::new("123456789012", "aws", "us-east-1", "x-123456789012-y");
        assert!(matches!(
            result,
            Err(crate::Error::OverlappingSubstitution { .. })
        ));
    }

    #[test]
    fn normalization_is_idempotent() {
        let identity = identity();
        let manifest = manifest();
        let phones = BTreeMap::from([("+15555550100".to_owned(), "+15555550199".to_owned())]);
        let normalizer = Normalizer::new(&identity.substitutions, &manifest, &phones);
        let content = serde_json::json!({
            "Actions": [{
                "Identifier": "play",
                "Type": "MessageParticipant",
                "Parameters": {
                    "PromptId": source_arn("prompt/src-prompt")
                }
            }, {
                "Identifier": "dial",
                "Type": "TransferParticipantToThirdParty",
                "Parameters": { "ThirdPartyPhoneNumber": "+15555550100" }
            }],
            "Metadata": {
                "ActionMetadata": {
                    "play": {
                        "audio": [{
                            "type": "Prompt",
                            "text": "Beep.wav",
                            "id": source_arn("prompt/src-prompt")
                        }]
                    },
                    "queue": {
                        "queue": {
                            "text": "BasicQueue",
                            "id": source_arn("queue/src-queue")
                        }
                    }
                }
            }
        })
        .to_string();

        let once = normalizer.normalize(&symbol(), &content).unwrap();
        for literal in [
            "123456789012",
            "us-east-1",
            INSTANCE,
            "src-prompt",
            "src-queue",
            "+15555550100",
        ] {
            assert!(!once.contains(literal), "'{literal}' survived normalization");
        }
        assert!(once.contains(&format!(
            "{}/prompt/dest-prompt",
            identity.normalized_instance_arn()
        )));
        assert!(once.contains("/queue/dest-queue"));
        assert!(once.contains("+15555550199"));

        let twice = normalizer.normalize(&symbol(), &once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unmapped_prompt_is_an_error() {
        let identity = identity();
        let manifest = Manifest::default();
        let phones = BTreeMap::new();
        let normalizer = Normalizer::new(&identity.substitutions, &manifest, &phones);
        let content = serde_json::json!({
            "Actions": [],
            "Metadata": {
                "ActionMetadata": {
                    "play": {
                        "audio": [{ "type": "Prompt", "text": "Missing.wav", "id": "prompt/p1" }]
                    }
                }
            }
        })
        .to_string();
        let err = normalizer.normalize(&symbol(), &content).unwrap_err();
        assert!(
            matches!(&err, crate::Error::UnmappedPrompt { prompt, .. } if prompt == "Missing.wav"),
            "{err}"
        );
    }

    #[test]
    fn unmapped_queue_is_an_error() {
        let identity = identity();
        let manifest = manifest();
        let phones = BTreeMap::new();
        let normalizer = Normalizer::new(&identity.substitutions, &manifest, &phones);
        let content = serde_json::json!({
            "Actions": [],
            "Metadata": {
                "ActionMetadata": {
                    "transfer": { "queue": { "text": "Escalations", "id": source_arn("queue/q9") } }
                }
            }
        })
        .to_string();
        let err = normalizer.normalize(&symbol(), &content).unwrap_err();
        assert!(
            matches!(
                &err,
                crate::Error::UnmappedQueue { queue, resource }
                    if queue == "Escalations" && resource == &symbol()
            ),
            "{err}"
        );
    }

    #[test]
    fn swapped_phone_numbers_are_each_mapped_once() {
        let identity = identity();
        let manifest = Manifest::default();
        let phones = BTreeMap::from([
            ("+15555550100".to_owned(), "+15555550200".to_owned()),
            ("+15555550200".to_owned(), "+15555550100".to_owned()),
        ]);
        let normalizer = Normalizer::new(&identity.substitutions, &manifest, &phones);
        let content = r#"{"A":"+15555550100","B":"+15555550200"}"#;
        assert_eq!(
            r#"{"A":"+15555550200","B":"+15555550100"}"#,
            normalizer.normalize(&symbol(), content).unwrap()
        );
    }

    #[test]
    fn chained_phone_numbers_are_not_remapped() {
        let identity = identity();
        let manifest = Manifest::default();
        let phones = BTreeMap::from([
            ("+15555550100".to_owned(), "+15555550200".to_owned()),
            ("+15555550200".to_owned(), "+15555550300".to_owned()),
        ]);
        let normalizer = Normalizer::new(&identity.substitutions, &manifest, &phones);
        let content = r#"{"A":"+15555550100"}"#;
        assert_eq!(
            r#"{"A":"+15555550200"}"#,
            normalizer.normalize(&symbol(), content).unwrap()
        );
    }

    #[test]
    fn text_to_speech_audio_is_left_alone() {
        let identity = identity();
        let manifest = Manifest::default();
        let phones = BTreeMap::new();
        let normalizer = Normalizer::new(&identity.substitutions, &manifest, &phones);
        let content = r#"{"Actions":[],"Metadata":{"ActionMetadata":{
            "m":{"audio":[{"type":"Text","text":"Hello"}]}}}}"#;
        assert_eq!(content, normalizer.normalize(&symbol(), content).unwrap());
    }
}
