use std::{
    fmt::{self, Write},
    sync::{Arc, OnceLock},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use arc_swap::ArcSwapOption;
use tracing::{Event, Subscriber, field, span, warn};
use tracing_subscriber::{
    filter::{Filtered, Targets},
    layer::{Context, Layer, Layered, SubscriberExt},
    registry::{LookupSpan, SpanRef},
    util::SubscriberInitExt,
    Registry,
};

/// Receives formatted log lines, e.g. to print them with `android.util.Log`
/// or `os_log`. Called on whichever thread emitted the event.
pub trait LogSink: Send + Sync {
    fn log(&self, line: String);
}

type BoxedSink = Box<dyn LogSink>;

/// The host's sink. Formatted log lines are sent here for printing on the
/// host side.
static HOST_LOG_SINK: ArcSwapOption<BoxedSink> = ArcSwapOption::const_empty();

/// Whether our [`HostLogLayer`] subscriber won the global subscriber slot.
static SINK_SUBSCRIBER_SET: OnceLock<bool> = OnceLock::new();

/// Forward `tracing` events to `sink`, filtered by the `RUST_LOG`-style
/// `rust_log` targets. Returns `true` if `sink` will receive events.
///
/// Safe to call more than once. Later calls only swap the sink, since the
/// global subscriber can only be set once per process. This keeps logging
/// working when the host recreates its UI (e.g. an Activity restart) and
/// re-initializes.
///
/// If some other global logger was set first, the sink never receives
/// anything. We warn through that logger instead of panicking.
pub fn init_with_sink(sink: impl LogSink + 'static, rust_log: &str) -> bool {
    let sink: BoxedSink = Box::new(sink);
    HOST_LOG_SINK.store(Some(Arc::new(sink)));

    let installed = *SINK_SUBSCRIBER_SET.get_or_init(|| {
        subscriber(&HOST_LOG_SINK, rust_log).try_init().is_ok()
    });
    if !installed {
        warn!("Another global logger is set; host log sink is disconnected");
    }
    installed
}

struct HostLogLayer {
    sink: &'static ArcSwapOption<BoxedSink>,
}

/// Span fields are formatted when an enabled span is first entered.
struct FormattedSpanFields {
    buf: String,
}

type SubscriberType =
    Layered<Filtered<HostLogLayer, Targets, Registry>, Registry>;

fn subscriber(
    sink: &'static ArcSwapOption<BoxedSink>,
    rust_log: &str,
) -> SubscriberType {
    let rust_log_filter = crate::targets_filter(Some(rust_log));
    let host_log_layer = HostLogLayer { sink }.with_filter(rust_log_filter);
    tracing_subscriber::registry().with(host_log_layer)
}

impl<S: Subscriber + for<'a> LookupSpan<'a>> Layer<S> for HostLogLayer {
    // When we enter into a new span, format the span fields and insert them
    // into this new span's extensions map.
    fn on_new_span(
        &self,
        attrs: &span::Attributes<'_>,
        id: &span::Id,
        ctx: Context<'_, S>,
    ) {
        let span = match ctx.span(id) {
            Some(span) => span,
            None => return,
        };
        let mut exts = span.extensions_mut();

        if exts.get_mut::<FormattedSpanFields>().is_none() {
            let mut fields = FormattedSpanFields { buf: String::new() };
            attrs.record(&mut FieldVisitor::new(&mut fields.buf));
            exts.insert(fields);
        }
    }

    // A new log event. Format it and hand it to the host.
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let sink = self.sink.load();
        let sink = match sink.as_ref() {
            Some(sink) => sink,
            None => return,
        };

        let mut line = String::new();
        if fmt_event(&mut line, event, ctx).is_ok() {
            sink.log(line);
        }
    }
}

// Adapted from:
// [`Format::<Compact, T>`::format_event`](https://github.com/tokio-rs/tracing/blob/tracing-subscriber-0.3.16/tracing-subscriber/src/fmt/format/mod.rs#L1012)
fn fmt_event<S: Subscriber + for<'a> LookupSpan<'a>>(
    buf: &mut String,
    event: &Event<'_>,
    ctx: Context<'_, S>,
) -> fmt::Result {
    let meta = event.metadata();
    let level = meta.level().as_str();

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64();

    // pad INFO and WARN so log messages align
    let level_pad = if level.len() == 4 { " " } else { "" };
    let target = meta.target();

    // metadata
    // ex: "1682371943.448209 R  INFO"
    write!(buf, "{timestamp:.06} R {level_pad}{level}")?;

    // span names
    // ex: " (authenticate):"
    let parent_span = event
        .parent()
        .and_then(|id| ctx.span(id))
        .or_else(|| ctx.lookup_current());
    fmt_span_names(buf, parent_span.as_ref())?;
    write!(buf, " {target}:")?;

    // event fields
    // ex: " result=\"SUCCESS\" Biometric challenge finished"
    event.record(&mut FieldVisitor::new(buf));

    // span fields
    fmt_span_fields(buf, parent_span.as_ref())?;

    Ok(())
}

// Adapted from:
// [`DefaultVisitor`](https://github.com/tokio-rs/tracing/blob/tracing-subscriber-0.3.16/tracing-subscriber/src/fmt/format/mod.rs#L1222)
struct FieldVisitor<'a> {
    buf: &'a mut String,
}

impl<'a> FieldVisitor<'a> {
    fn new(buf: &'a mut String) -> Self {
        Self { buf }
    }
}

impl field::Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &field::Field, value: &str) {
        if field.name() == "message" {
            self.record_debug(field, &format_args!("{value}"))
        } else {
            self.record_debug(field, &value)
        }
    }

    fn record_debug(&mut self, field: &field::Field, value: &dyn fmt::Debug) {
        // Writing to a `String` can't fail.
        let _ = match field.name() {
            "message" => write!(self.buf, " {value:?}"),
            // skip `log` crate metadata
            name if name.starts_with("log.") => Ok(()),
            name => write!(self.buf, " {name}={value:?}"),
        };
    }
}

// Adapted from:
// [`FmtCtx::fmt`](https://github.com/tokio-rs/tracing/blob/tracing-subscriber-0.3.16/tracing-subscriber/src/fmt/format/mod.rs#L1353)
fn fmt_span_names<S: Subscriber + for<'a> LookupSpan<'a>>(
    buf: &mut String,
    span: Option<&SpanRef<S>>,
) -> fmt::Result {
    let scope = span.into_iter().flat_map(|span| span.scope().from_root());

    let mut first = true;
    for span in scope {
        if first {
            buf.write_char(' ')?;
            first = false;
        }
        write!(buf, "{}:", span.metadata().name())?;
    }

    Ok(())
}

fn fmt_span_fields<S: Subscriber + for<'a> LookupSpan<'a>>(
    buf: &mut String,
    span: Option<&SpanRef<S>>,
) -> fmt::Result {
    let scope = span.into_iter().flat_map(|span| span.scope().from_root());

    for span in scope {
        let exts = span.extensions();
        if let Some(fields) = exts.get::<FormattedSpanFields>()
            && !fields.buf.is_empty()
        {
            buf.push_str(&fields.buf);
        }
    }

    Ok(())
}
