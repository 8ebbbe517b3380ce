use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

use crate::context::{attribute_lines, ErrorContext};
use crate::failure::Failure;
use crate::kind::ErrorKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("no message context registered under {0:?}")]
    UnknownContext(String),
    #[error("message context {0:?} is already registered")]
    DuplicateContext(String),
}

/// Something that can produce the raw display template for its failures.
pub trait TemplateSource: Send + Sync {
    fn name(&self) -> &str;
    fn template(&self, failure: &Failure) -> String;
    /// Joins a replacement sentence with the failure's attribute lines.
    fn with_sentence(&self, sentence: &str, failure: &Failure) -> String;
}

impl TemplateSource for ErrorContext {
    fn name(&self) -> &str {
        ErrorContext::name(self)
    }

    fn template(&self, failure: &Failure) -> String {
        self.template_text(failure)
    }

    fn with_sentence(&self, sentence: &str, failure: &Failure) -> String {
        self.join(sentence.to_string(), &attribute_lines(failure))
    }
}

/// Registry of message contexts, filled once at startup and then only read.
#[derive(Default)]
pub struct Catalog {
    sources: BTreeMap<String, Box<dyn TemplateSource>>,
    overrides: BTreeMap<String, BTreeMap<ErrorKind, String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: Box<dyn TemplateSource>) -> Result<(), MessageError> {
        let name = source.name().to_string();
        if self.sources.contains_key(&name) {
            return Err(MessageError::DuplicateContext(name));
        }
        self.sources.insert(name, source);
        Ok(())
    }

    /// Replace the sentence shown for `kind` in `context`.
    pub fn localize(&mut self, context: &str, kind: ErrorKind, sentence: impl Into<String>) {
        self.overrides
            .entry(context.to_string())
            .or_default()
            .insert(kind, sentence.into());
    }

    pub fn is_registered(&self, context: &str) -> bool {
        self.sources.contains_key(context)
    }

    /// The unsubstituted template for `failure`.
    pub fn template(&self, failure: &Failure) -> Result<String, MessageError> {
        let source = self
            .sources
            .get(failure.context())
            .ok_or_else(|| MessageError::UnknownContext(failure.context().to_string()))?;
        let sentence = self
            .overrides
            .get(failure.context())
            .and_then(|kinds| kinds.get(&failure.kind()));
        Ok(match sentence {
            Some(sentence) => source.with_sentence(sentence, failure),
            None => source.template(failure),
        })
    }

    /// Display text for `failure` with every `${name}` replaced by the value
    /// of that attribute. Placeholders naming no attribute are left as is.
    pub fn compose(&self, failure: &Failure) -> Result<String, MessageError> {
        let template = self.template(failure)?;
        Ok(substitute(&template, failure))
    }
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern")
    })
}

pub fn substitute(template: &str, failure: &Failure) -> String {
    placeholder()
        .replace_all(template, |caps: &Captures| match failure.attribute(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
