//! Tail ordering specs
//!
//! Verify `walscan tail` prints messages in time tick order.

use crate::prelude::*;

fn shuffled_shards(temp: &Dumps) {
    temp.channel(
        "dml_0",
        &[
            insert(1, 5, "shard-a"),
            insert(2, 3, "shard-b"),
            time_tick(3, 5),
            insert(4, 8, "shard-a"),
            insert(5, 7, "shard-b"),
            time_tick(6, 8),
        ],
    );
}

#[test]
fn tail_prints_messages_in_time_tick_order() {
    let temp = Dumps::empty();
    shuffled_shards(&temp);

    let run = temp
        .walscan()
        .args(&["tail", "--pchannel", "dml_0", "--data-dir", &temp.data_dir(), "--limit", "4"])
        .passes();

    let ticks: Vec<String> = run
        .stdout_lines()
        .iter()
        .filter_map(|l| l.split("[TimeTick=").nth(1)?.split(']').next().map(str::to_string))
        .collect();
    assert_eq!(ticks, vec!["3", "5", "7", "8"]);
}

#[test]
fn tail_stops_at_limit() {
    let temp = Dumps::empty();
    shuffled_shards(&temp);

    let run = temp
        .walscan()
        .args(&["tail", "--pchannel", "dml_0", "--data-dir", &temp.data_dir(), "--limit", "1"])
        .passes()
        .stderr_has("Reached limit 1, stopping consumption.");
    assert_eq!(run.stdout_lines().len(), 1);
    assert!(run.stdout().contains("[VChannel=shard-b]"));
}

#[test]
fn tail_hides_time_ticks_unless_asked() {
    let temp = Dumps::empty();
    shuffled_shards(&temp);

    temp.walscan()
        .args(&["tail", "--pchannel", "dml_0", "--data-dir", &temp.data_dir(), "--limit", "4"])
        .passes()
        .stdout_lacks("[Type=TimeTick]");

    temp.walscan()
        .args(&[
            "tail",
            "--pchannel",
            "dml_0",
            "--data-dir",
            &temp.data_dir(),
            "--limit",
            "3",
            "--show-system",
        ])
        .passes()
        .stdout_has("[Type=TimeTick] [VChannel=] [TimeTick=5]");
}

#[test]
fn tail_filters_by_vchannel() {
    let temp = Dumps::empty();
    shuffled_shards(&temp);

    temp.walscan()
        .args(&[
            "tail",
            "--pchannel",
            "dml_0",
            "--data-dir",
            &temp.data_dir(),
            "--vchannel",
            "shard-a",
            "--limit",
            "2",
        ])
        .passes()
        .stdout_lacks("shard-b")
        .stdout_has("[VChannel=shard-a] [TimeTick=8]");
}

#[test]
fn tail_resumes_after_message_id() {
    let temp = Dumps::empty();
    shuffled_shards(&temp);

    temp.walscan()
        .args(&[
            "tail",
            "--pchannel",
            "dml_0",
            "--data-dir",
            &temp.data_dir(),
            "--from",
            "after:3",
            "--limit",
            "1",
        ])
        .passes()
        .stdout_has("[TimeTick=7]")
        .stdout_has("[MessageID=5]");
}

#[test]
fn tail_prints_transaction_as_one_unit() {
    let temp = Dumps::empty();
    temp.channel(
        "dml_0",
        &[
            txn(MessageType::BeginTxn, 1, 8, 42),
            txn(MessageType::Insert, 2, 9, 42),
            time_tick(3, 10),
            txn(MessageType::CommitTxn, 4, 15, 42),
            time_tick(5, 20),
        ],
    );

    let run = temp
        .walscan()
        .args(&["tail", "--pchannel", "dml_0", "--data-dir", &temp.data_dir(), "--limit", "1"])
        .passes();

    let lines = run.stdout_lines();
    assert_eq!(lines.len(), 4, "{lines:?}");
    assert!(lines[0].starts_with("[Type=Txn]"));
    assert!(lines[1].starts_with("  [Type=BeginTxn]"));
    assert!(lines[2].starts_with("  [Type=Insert]"));
    assert!(lines[3].starts_with("  [Type=CommitTxn]"));
}

#[test]
fn tail_json_output_round_trips() {
    let temp = Dumps::empty();
    shuffled_shards(&temp);

    let run = temp
        .walscan()
        .args(&[
            "tail",
            "--pchannel",
            "dml_0",
            "--data-dir",
            &temp.data_dir(),
            "--types",
            "insert",
            "--output",
            "json",
            "--limit",
            "2",
        ])
        .passes();

    let parsed: Vec<ImmutableMessage> = run
        .stdout_lines()
        .iter()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(parsed, vec![insert(2, 3, "shard-b"), insert(1, 5, "shard-a")]);
}

#[test]
fn tail_reads_data_dir_from_config() {
    let temp = Dumps::empty();
    shuffled_shards(&temp);
    temp.file(
        "config/walscan/config.toml",
        &format!("data_dir = {:?}\n", temp.data_dir()),
    );

    temp.walscan()
        .args(&["tail", "--pchannel", "dml_0", "--limit", "1"])
        .passes()
        .stdout_has("[TimeTick=3]");
}
