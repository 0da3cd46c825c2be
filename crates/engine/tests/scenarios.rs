// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scanner scenarios against the fake broker

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;
use ws_adapters::{Broker, BrokerReader, FakeBroker};
use ws_core::{
    DeliverFilter, ImmutableMessage, MessageBuilder, MessageId, MessageType, PChannelInfo,
    TxnContext,
};
use ws_engine::{ReadOption, Scanner, ScannerConfig};

const CHANNEL: &str = "by-dev-rootcoord-dml_0";

fn insert(tick: u64, vchannel: &str) -> ImmutableMessage {
    MessageBuilder::new(MessageType::Insert)
        .tick(tick)
        .vchannel(vchannel)
        .build()
}

fn time_tick(tick: u64) -> ImmutableMessage {
    MessageBuilder::new(MessageType::TimeTick).tick(tick).build()
}

fn volatile_time_tick(tick: u64) -> ImmutableMessage {
    MessageBuilder::new(MessageType::TimeTick)
        .tick(tick)
        .persisted(false)
        .build()
}

fn txn_msg(ty: MessageType, txn_id: i64, tick: u64) -> ImmutableMessage {
    MessageBuilder::new(ty)
        .tick(tick)
        .txn(TxnContext::new(txn_id, Duration::ZERO))
        .build()
}

async fn open(broker: &FakeBroker) -> Arc<dyn BrokerReader> {
    Arc::from(broker.open(PChannelInfo::read_only(CHANNEL)).await.unwrap())
}

async fn recv(scanner: &mut Scanner) -> ImmutableMessage {
    tokio::time::timeout(Duration::from_secs(5), scanner.recv())
        .await
        .unwrap()
        .unwrap()
}

async fn collect(scanner: &mut Scanner, count: usize) -> Vec<(MessageType, u64, MessageId)> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let msg = recv(scanner).await;
        out.push((msg.message_type(), msg.time_tick(), msg.id()));
    }
    out
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn reordered_shards_are_released_by_time_tick() {
    let broker = FakeBroker::new();
    broker.append_all(
        CHANNEL,
        [insert(5, "shard-a"), insert(3, "shard-b"), time_tick(5)],
    );
    let mut scanner = Scanner::new(open(&broker).await, ReadOption::new(), ScannerConfig::default());

    let m2 = recv(&mut scanner).await;
    let m1 = recv(&mut scanner).await;
    let tt = recv(&mut scanner).await;
    assert_eq!((m2.vchannel(), m2.time_tick()), ("shard-b", 3));
    assert_eq!((m1.vchannel(), m1.time_tick()), ("shard-a", 5));
    assert_eq!((tt.message_type(), tt.time_tick()), (MessageType::TimeTick, 5));

    scanner.close().await.unwrap();
}

#[tokio::test]
async fn transaction_is_released_as_a_unit() {
    let broker = FakeBroker::new();
    broker.append_all(
        CHANNEL,
        [
            txn_msg(MessageType::BeginTxn, 1, 8),
            txn_msg(MessageType::Insert, 1, 9),
            time_tick(10),
            txn_msg(MessageType::CommitTxn, 1, 15),
            time_tick(20),
        ],
    );
    let mut scanner = Scanner::new(open(&broker).await, ReadOption::new(), ScannerConfig::default());

    // Nothing from the open transaction at tick 10
    let first = recv(&mut scanner).await;
    assert_eq!(
        (first.message_type(), first.time_tick()),
        (MessageType::TimeTick, 10)
    );

    let txn = recv(&mut scanner).await;
    assert_eq!(txn.message_type(), MessageType::Txn);
    let members: Vec<MessageType> = txn.txn_members().iter().map(|m| m.message_type()).collect();
    assert_eq!(
        members,
        vec![
            MessageType::BeginTxn,
            MessageType::Insert,
            MessageType::CommitTxn
        ]
    );

    let last = recv(&mut scanner).await;
    assert_eq!(
        (last.message_type(), last.time_tick()),
        (MessageType::TimeTick, 20)
    );

    scanner.close().await.unwrap();
}

#[tokio::test]
async fn rolled_back_transaction_is_never_delivered() {
    let broker = FakeBroker::new();
    broker.append_all(
        CHANNEL,
        [
            txn_msg(MessageType::BeginTxn, 7, 1),
            txn_msg(MessageType::Insert, 7, 2),
            txn_msg(MessageType::RollbackTxn, 7, 3),
            insert(4, ""),
            time_tick(5),
        ],
    );
    let mut scanner = Scanner::new(open(&broker).await, ReadOption::new(), ScannerConfig::default());

    let got = collect(&mut scanner, 2).await;
    assert_eq!(
        got.iter().map(|(t, tick, _)| (*t, *tick)).collect::<Vec<_>>(),
        vec![(MessageType::Insert, 4), (MessageType::TimeTick, 5)]
    );

    scanner.close().await.unwrap();
}

#[tokio::test]
async fn slow_consumer_bounds_buffering() {
    let broker = FakeBroker::new();
    for tick in 1..=25 {
        broker.append(CHANNEL, insert(tick, ""));
        broker.append(CHANNEL, volatile_time_tick(tick));
    }
    let mut scanner = Scanner::new(open(&broker).await, ReadOption::new(), ScannerConfig::default());

    // One message in the delivery channel, 17 in the pending queue, one in
    // the raw channel and one held by the produce loop
    settle().await;
    assert_eq!(broker.delivered_count(), 38);
    settle().await;
    assert_eq!(broker.delivered_count(), 38);

    assert_eq!(recv(&mut scanner).await.time_tick(), 1);
    settle().await;
    assert_eq!(broker.delivered_count(), 40);

    let rest = collect(&mut scanner, 24).await;
    let ticks: Vec<u64> = rest.iter().map(|(_, tick, _)| *tick).collect();
    assert_eq!(ticks, (2..=25).collect::<Vec<u64>>());

    scanner.close().await.unwrap();
}

#[tokio::test]
async fn transient_failures_do_not_change_output() {
    let log: Vec<ImmutableMessage> = (1..=12u64)
        .flat_map(|round| {
            let base = round * 10;
            [
                insert(base + 2, "v1"),
                insert(base + 1, "v2"),
                time_tick(base + 3),
            ]
        })
        .collect();

    let clean = FakeBroker::new();
    clean.append_all(CHANNEL, log.clone());
    let mut scanner = Scanner::new(
        open(&clean).await,
        ReadOption::new(),
        ScannerConfig::for_testing(),
    );
    let expected = collect(&mut scanner, log.len()).await;
    scanner.close().await.unwrap();

    let flaky = FakeBroker::new();
    flaky.append_all(CHANNEL, log.clone());
    flaky.fail_next_reads(3);
    flaky.fail_session_after(5);
    flaky.fail_session_after(0);
    flaky.fail_session_after(7);
    let mut scanner = Scanner::new(
        open(&flaky).await,
        ReadOption::new(),
        ScannerConfig::for_testing(),
    );
    let got = collect(&mut scanner, log.len()).await;
    scanner.close().await.unwrap();

    similar_asserts::assert_eq!(got, expected);
    assert!(flaky.read_policies().len() >= 7);
    assert_eq!(flaky.reader_close_count(), 1);
}

#[tokio::test]
async fn filters_apply_before_ordering() {
    let broker = FakeBroker::new();
    broker.append_all(
        CHANNEL,
        [
            insert(2, ""),
            MessageBuilder::new(MessageType::Delete).tick(1).build(),
            time_tick(3),
            insert(4, ""),
            time_tick(5),
        ],
    );
    let option = ReadOption::new()
        .filter(DeliverFilter::MessageType(vec![MessageType::Insert]))
        .filter(DeliverFilter::TimeTickGt(2));
    let mut scanner = Scanner::new(open(&broker).await, option, ScannerConfig::default());

    let got = collect(&mut scanner, 3).await;
    assert_eq!(
        got.iter().map(|(t, tick, _)| (*t, *tick)).collect::<Vec<_>>(),
        vec![
            (MessageType::TimeTick, 3),
            (MessageType::Insert, 4),
            (MessageType::TimeTick, 5)
        ]
    );

    scanner.close().await.unwrap();
}
