//! Record Lifecycle
//!
//! This example drives a record through loading, editing and saving.
//!
//! Key concepts:
//! - Flags resolved from the current lifecycle state
//! - Pending, in-flight and canonical attribute layers
//! - Events a state does not accept are rejected without side effects
//! - Lifecycle callbacks queued for the owner
//!
//! Run with: cargo run --example record_lifecycle

use serde_json::json;
use statetree::lifecycle::{Attributes, Errors, Record};

fn show(label: &str, record: &Record) {
    let flags = record.flags();
    println!("{label}");
    println!("  state:  {}", record.state_path());
    println!(
        "  flags:  loaded={} dirty={} saving={} valid={}",
        flags.is_loaded, flags.is_dirty, flags.is_saving, flags.is_valid
    );
    println!("  title:  {:?}\n", record.get("title"));
}

fn main() {
    println!("=== Record Lifecycle ===\n");

    let mut record = Record::new().unwrap();
    show("New record:", &record);

    record.load().unwrap();
    let data: Attributes = [("title".to_string(), json!("Hello"))].into_iter().collect();
    record.push(data).unwrap();
    show("Loaded from storage:", &record);

    record.set("title", json!("")).unwrap();
    show("Edited:", &record);

    record.will_commit().unwrap();
    show("Saving:", &record);

    let errors: Errors = [("title".to_string(), "can't be blank".to_string())]
        .into_iter()
        .collect();
    record.became_invalid(errors).unwrap();
    show("Rejected by storage:", &record);

    if let Err(error) = record.will_commit() {
        println!("Saving an invalid record fails: {error}\n");
    }

    record.set("title", json!("Hello, world")).unwrap();
    record.will_commit().unwrap();
    record.did_commit(None).unwrap();
    show("Fixed and saved:", &record);

    println!("Callbacks: {:?}", record.take_callbacks());

    println!("\n=== Example Complete ===");
}
