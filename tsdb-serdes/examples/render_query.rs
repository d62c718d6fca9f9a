//! Example rendering a small query result as OpenTSDB v2 JSON.
//!
//! Run with: `RUST_LOG=tsdb_serdes=trace cargo run -p tsdb-serdes --example render_query`

use std::io::Write;

use tracing_subscriber::EnvFilter;
use tsdb_serdes::error::Result;
use tsdb_serdes::generator::JsonGenerator;
use tsdb_serdes::groups::IteratorGroups;
use tsdb_serdes::id::{GroupId, TimeSeriesId};
use tsdb_serdes::sample::Timestamp;
use tsdb_serdes::serdes::{JsonV2QuerySerdes, QuerySerdes};
use tsdb_serdes::shard::NumericMillisecondShard;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let start = Timestamp::from_millis(1_486_045_800_000);
    let end = Timestamp::from_millis(1_486_046_000_000);
    let mut results = IteratorGroups::new();

    for (group, host, values) in [
        ("a", "web01", [42.0, 9866.854, -128.0]),
        ("a", "web02", [8.0, f64::NAN, 5000.0]),
        ("b", "web01", [5.0, f64::INFINITY, 2.0]),
    ] {
        let id = TimeSeriesId::builder()
            .add_metric("sys.cpu.user")
            .add_tag("host", host)
            .add_tag("dc", "phx")
            .build()?;
        let mut shard = NumericMillisecondShard::new(id, start, end)?;
        for (ts, value) in [1_486_045_801_000, 1_486_045_871_000, 1_486_045_881_000]
            .into_iter()
            .zip(values)
        {
            shard.add(ts, value, 1)?;
        }
        results.add_iterator(&GroupId::new(group)?, shard);
    }

    let mut serdes = JsonV2QuerySerdes::new(Some(JsonGenerator::new()))?;
    let mut stdout = std::io::stdout().lock();
    serdes.serialize(Some(&mut stdout), Some(&results))?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
