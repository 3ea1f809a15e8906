// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Irrigation node for hosts without sensor or GPIO hardware.
//!
//! Runs the synchronization loop against the real store, replaying the
//! configured humidity values in place of a sensor and reporting relay
//! levels on the console.
//!
//! # Usage
//!
//! ```bash
//! irrigation-node <config.json>
//! IRRIGATION_CONFIG=/etc/irrigation.json irrigation-node
//! RUST_LOG=irrigation_sync=debug irrigation-node node.json
//! ```

use std::env;
use std::path::PathBuf;

use irrigation_sync::{ConsolePin, NodeConfig, ScriptedSensor, SyncLoop, SystemClock};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "IRRIGATION_CONFIG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(path) = config_path(&args) else {
        print_usage(args.first().map_or("irrigation-node", String::as_str));
        std::process::exit(1);
    };

    let config = NodeConfig::load(&path)?;
    let store = config.store.clone().into_store()?;
    tracing::info!(store = %store.base_url(), "Using remote store");

    let mut node = SyncLoop::new(
        config.sync,
        store,
        ScriptedSensor::cycle(config.simulated_humidity),
        ConsolePin::new(),
        SystemClock::new(),
    )?;

    let mut state = node.start();
    node.run(&mut state).await;
    Ok(())
}

fn config_path(args: &[String]) -> Option<PathBuf> {
    args.get(1)
        .map(PathBuf::from)
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from))
}

fn print_usage(program: &str) {
    eprintln!("Usage:");
    eprintln!("  {program} <config.json>");
    eprintln!("  {CONFIG_ENV}=<config.json> {program}");
    eprintln!();
    eprintln!("Minimal configuration:");
    eprintln!(r#"  {{ "store": {{ "host": "my-project-default-rtdb.firebaseio.com" }} }}"#);
}
