//! Compare specs
//!
//! Verify `walscan compare` reports matching and diverging channels.

use crate::prelude::*;

fn replica_of(origin: &ImmutableMessage, id: u64, tick: u64) -> ImmutableMessage {
    MessageBuilder::new(origin.message_type())
        .id(MessageId::Sequence(id))
        .tick(tick)
        .replicate_header(ReplicateHeader {
            cluster_id: "primary".to_string(),
            message_id: origin.id(),
            last_confirmed_message_id: None,
            time_tick: origin.time_tick(),
            vchannel: origin.vchannel().to_string(),
        })
        .build()
}

fn compare(temp: &Dumps, rounds: &str) -> Cli {
    temp.walscan().args(&[
        "compare",
        "--pchannels",
        "primary,secondary",
        "--data-dir",
        &temp.data_dir(),
        "--rounds",
        rounds,
    ])
}

#[test]
fn identical_channels_are_consistent() {
    let temp = Dumps::empty();
    let log = [
        message(MessageType::CreateCollection, 1, 1),
        time_tick(2, 1),
        insert(3, 2, "v0"),
        time_tick(4, 2),
    ];
    temp.channel("primary", &log);
    temp.channel("secondary", &log);

    let run = compare(&temp, "2")
        .passes()
        .stdout_has("✅ [Type=CreateCollection]")
        .stdout_has("[PChannels=[primary secondary]] [Counts=[2 2]]");
    assert_eq!(run.stdout_lines().len(), 2);
}

#[test]
fn replicated_channel_matches_by_origin_id() {
    let temp = Dumps::empty();
    let origin = insert(3, 2, "v0");
    temp.channel("primary", &[origin.clone(), time_tick(4, 2)]);
    temp.channel(
        "secondary",
        &[replica_of(&origin, 10, 50), time_tick(11, 50)],
    );

    compare(&temp, "1")
        .passes()
        .stdout_has("[MessageIDs=[3 10(r:3)]] [TimeTicks=[2 50(r:2)]]");
}

#[test]
fn diverging_channels_are_reported() {
    let temp = Dumps::empty();
    temp.channel(
        "primary",
        &[insert(1, 1, "v0"), time_tick(2, 1), insert(3, 2, "v0"), time_tick(4, 2)],
    );
    temp.channel(
        "secondary",
        &[
            insert(1, 1, "v0"),
            time_tick(2, 1),
            message(MessageType::Delete, 3, 2),
            time_tick(4, 2),
        ],
    );

    compare(&temp, "5")
        .fails()
        .stdout_has("❌ INCONSISTENCY DETECTED!")
        .stdout_has("PChannel primary: [Type=Insert]")
        .stdout_has("PChannel secondary: [Type=Delete]")
        .stderr_has("message inconsistency detected between pchannels");
}
