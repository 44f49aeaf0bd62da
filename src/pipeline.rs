//! Compiled, immutable record pipeline.

use crate::config::{
    flag_option, is_reserved, list_option, string_option, ConfigError, RuleSet, CHAR_ENCODING,
    DEFAULT_TAG_KEY, INCLUDE_TAG_KEY, REMOVE_KEYS, REMOVE_PATH, TAG, TAG_KEY, WHITELIST_KEYS,
};
use crate::context::ExpressionContext;
use crate::path::FieldPath;
use crate::record::Record;
use crate::transformer::{
    EncodingPolicy, KeyFilter, RemovePaths, Stage, StaticFields, TagPolicy,
};
use tracing::{info, trace};

/// A ready-to-run set of record mutations.
///
/// Built once by [`Pipeline::compile`], never mutated afterwards, and safe
/// to share across threads.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    encoding: EncodingPolicy,
    remove_paths: RemovePaths,
    key_filter: KeyFilter,
    static_fields: StaticFields,
    tag_policy: TagPolicy,
    emit_tag: Option<String>,
}

impl Pipeline {
    /// Compile a rule set, resolving expressions against the current
    /// process environment.
    pub fn compile(rules: &RuleSet) -> Result<Self, ConfigError> {
        Self::compile_with(rules, &ExpressionContext::from_environment())
    }

    /// Compile a rule set against an explicit expression context.
    pub fn compile_with(rules: &RuleSet, ctx: &ExpressionContext) -> Result<Self, ConfigError> {
        // Control options first.
        let key_filter = match (rules.get(REMOVE_KEYS), rules.get(WHITELIST_KEYS)) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingKeyFilters),
            (Some(keys), None) => {
                KeyFilter::Remove(list_option(REMOVE_KEYS, keys)?.into_iter().collect())
            }
            (None, Some(keys)) => {
                KeyFilter::Whitelist(list_option(WHITELIST_KEYS, keys)?.into_iter().collect())
            }
            (None, None) => KeyFilter::None,
        };

        let remove_paths = match rules.get(REMOVE_PATH) {
            Some(paths) => RemovePaths::new(
                list_option(REMOVE_PATH, paths)?
                    .iter()
                    .filter_map(|p| FieldPath::parse(p))
                    .collect(),
            ),
            None => RemovePaths::default(),
        };

        let encoding = match rules.get(CHAR_ENCODING) {
            Some(value) => EncodingPolicy::parse(&string_option(CHAR_ENCODING, value)?)?,
            None => EncodingPolicy::None,
        };

        let tag_policy = TagPolicy {
            enabled: rules
                .get(INCLUDE_TAG_KEY)
                .map(|v| flag_option(INCLUDE_TAG_KEY, v))
                .transpose()?
                .unwrap_or(false),
            injected_key: rules
                .get(TAG_KEY)
                .map(|v| string_option(TAG_KEY, v))
                .transpose()?
                .unwrap_or_else(|| DEFAULT_TAG_KEY.to_string()),
        };

        let emit_tag = rules
            .get(TAG)
            .map(|v| string_option(TAG, v))
            .transpose()?
            .filter(|t| !t.is_empty());

        // Everything left is a static field.
        let mut fields = Vec::new();
        for (name, value) in rules.iter().filter(|(name, _)| !is_reserved(name)) {
            fields.push((name.to_string(), ctx.interpolate_value(value)?));
        }
        let static_fields = StaticFields::new(fields);

        let pipeline = Self {
            encoding,
            remove_paths,
            key_filter,
            static_fields,
            tag_policy,
            emit_tag,
        };

        info!(
            static_fields = pipeline.static_fields.len(),
            remove_paths = pipeline.remove_paths.paths().len(),
            key_filter = pipeline.key_filter.name(),
            char_encoding = ?pipeline.encoding,
            include_tag_key = pipeline.tag_policy.enabled,
            "Record pipeline compiled"
        );

        Ok(pipeline)
    }

    /// Apply every stage to `record` and return it.
    pub fn transform(&self, mut record: Record, tag: &str) -> Record {
        self.transform_in_place(&mut record, tag);
        record
    }

    /// Apply every stage to `record`, in order: encoding, path removal, key
    /// filter, static fields, tag injection.
    pub fn transform_in_place(&self, record: &mut Record, tag: &str) {
        for stage in self.stages() {
            if stage.is_noop() {
                continue;
            }
            trace!(stage = stage.name(), tag, "Applying stage");
            stage.apply(record, tag);
        }
    }

    fn stages(&self) -> [&dyn Stage; 5] {
        [
            &self.encoding,
            &self.remove_paths,
            &self.key_filter,
            &self.static_fields,
            &self.tag_policy,
        ]
    }

    pub fn encoding(&self) -> &EncodingPolicy {
        &self.encoding
    }

    pub fn remove_paths(&self) -> &[FieldPath] {
        self.remove_paths.paths()
    }

    pub fn key_filter(&self) -> &KeyFilter {
        &self.key_filter
    }

    pub fn static_fields(&self) -> &StaticFields {
        &self.static_fields
    }

    pub fn tag_policy(&self) -> &TagPolicy {
        &self.tag_policy
    }

    /// Tag to re-emit records under, if configured.
    pub fn emit_tag(&self) -> Option<&str> {
        self.emit_tag.as_deref()
    }
}
