use std::sync::Once;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Routes the events of the tandem crates to the test output, once per test
/// binary.
pub fn init_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let targets = Targets::new()
            .with_default(LevelFilter::WARN)
            .with_target("tandem_producer", LevelFilter::DEBUG)
            .with_target("tandem_rabbitmq", LevelFilter::DEBUG);

        let layer = tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_filter(targets);

        // Another subscriber may already be installed
        let _ = tracing_subscriber::registry().with(layer).try_init();
    });
}
