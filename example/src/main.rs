use tracing::trace_span;
use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use pgcell::Result;

mod composite;
mod array;
mod json;
mod decode;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::Registry::default()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    trace_span!("composite").in_scope(composite::main)?;
    trace_span!("array").in_scope(array::main)?;
    trace_span!("json").in_scope(json::main)?;
    trace_span!("decode").in_scope(decode::main)?;

    Ok(())
}
