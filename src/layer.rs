use crate::global;
use crate::level::Severity;
use crate::record::{short_caller, Field};
use crate::router::LeveledRouter;
use serde_json::Value;
use std::sync::Arc;
use tracing::field::{Field as TracingField, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns `tracing` events into log
/// records and routes them through a [`LeveledRouter`].
///
/// A layer built with [`LeveledLayer::global`] resolves the process-wide
/// router on every event, so it keeps working across reconfiguration.
pub struct LeveledLayer {
    router: Option<Arc<LeveledRouter>>,
}

impl LeveledLayer {
    /// Route into a fixed router.
    pub fn new(router: Arc<LeveledRouter>) -> Self {
        LeveledLayer { router: Some(router) }
    }

    /// Route into whatever [`global::current`] returns at event time.
    pub fn global() -> Self {
        LeveledLayer { router: None }
    }

    fn router(&self) -> Arc<LeveledRouter> {
        match &self.router {
            Some(router) => Arc::clone(router),
            None => global::current(),
        }
    }
}

impl<S> Layer<S> for LeveledLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let severity = Severity::from(meta.level());

        let router = self.router();
        if !router.enabled(severity) {
            return;
        }

        let mut fields = Vec::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
        event.record(&mut visitor);

        let caller = match (meta.file(), meta.line()) {
            (Some(file), Some(line)) => short_caller(file, line),
            _ => meta.target().to_string(),
        };

        router.log(severity, message.as_deref().unwrap_or_default(), fields, caller);
    }
}

/// Collects event fields: `message` becomes the record message, the rest
/// become attachments in declaration order.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut Vec<Field>,
    pub message: &'a mut Option<String>,
}

impl FieldVisitor<'_> {
    fn push(&mut self, field: &TracingField, value: Value) {
        self.fields.push(Field::new(field.name(), value));
    }
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &TracingField, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.push(field, Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.push(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.push(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.push(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.push(field, Value::from(value));
    }

    fn record_error(&mut self, field: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.push(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.push(field, Value::String(format!("{:?}", value)));
        }
    }
}
