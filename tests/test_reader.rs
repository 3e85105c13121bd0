mod common;
use common::*;

use smartgen_bridge::reader::Reader;
use std::sync::Arc;
use std::time::Duration;

fn timeout() -> Error {
    Error::Timeout {
        operation: "read",
        after: Duration::from_millis(10),
    }
}

fn reads_of(fake: &Fake, address: u16) -> usize {
    let prefix = format!("read {} ", address);
    fake.ops().iter().filter(|op| op.starts_with(&prefix)).count()
}

#[tokio::test]
async fn read_all_decodes_every_block() {
    common_setup();

    let fake = Fake::new();
    fake.set(0, &[1 << 9]);
    fake.set(260, &[9]);
    fake.set(212, &[1500]);
    let reader = Factory::reader(Factory::generator(), &fake);

    let fields = reader.read_all().await.unwrap();

    assert_eq!(fields["mode_auto"], Value::Bool(true));
    assert_eq!(fields["engine_speed"], Value::Int(1500));
    assert_eq!(fields["gen_status_text"], Value::from("running"));
    assert_eq!(fake.ops().len(), hgm9520n_blocks());
    fake.with(|s| {
        assert_eq!(s.cycles, 1);
        assert_eq!(s.connects, 1);
    });

    // connection is reused
    reader.read_all().await.unwrap();
    fake.with(|s| {
        assert_eq!(s.cycles, 2);
        assert_eq!(s.connects, 1);
    });
}

fn hgm9520n_blocks() -> usize {
    Family::Hgm9520n.register_map().blocks.len()
}

#[tokio::test]
async fn failing_block_is_retried_then_skipped() {
    common_setup();

    let fake = Fake::new();
    fake.with(|s| {
        s.failing.insert(212, timeout());
    });
    let reader = Factory::reader(Factory::generator(), &fake);

    let fields = reader.read_all().await.unwrap();

    assert!(!fields.contains_key("engine_speed"));
    assert!(!fields.contains_key("coolant_temp"));
    assert!(fields.contains_key("gen_status"));
    assert!(fields.contains_key("alarm_sd_0"));
    assert_eq!(reads_of(&fake, 212), 2);
    assert_eq!(fake.ops().len(), hgm9520n_blocks() + 1);
}

#[tokio::test]
async fn exceptions_are_not_retried() {
    common_setup();

    let fake = Fake::new();
    fake.with(|s| {
        s.failing.insert(
            511,
            Error::Exception {
                function: 0x03,
                code: 0x02,
            },
        );
    });
    let reader = Factory::reader(Factory::generator(), &fake);

    let fields = reader.read_all().await.unwrap();
    assert!(!fields.contains_key("alarm_count"));
    assert_eq!(reads_of(&fake, 511), 1);
}

#[tokio::test]
async fn every_block_failing_is_no_data() {
    common_setup();

    let fake = Fake::new();
    fake.with(|s| {
        for block in Family::Hgm9560.register_map().blocks {
            s.failing.insert(block.address, timeout());
        }
    });
    let reader = Factory::reader(Factory::ats(), &fake);

    assert_eq!(reader.read_all().await, Err(Error::NoData));
    // every attempt ran on its own socket and none is left open
    fake.with(|s| {
        assert_eq!(s.connects, 2 * s.ops.len());
        assert_eq!(s.disconnects, s.connects);
    });
}

#[tokio::test]
async fn timed_out_block_retries_on_a_fresh_socket() {
    common_setup();

    let fake = Fake::new();
    fake.with(|s| {
        s.failing.insert(212, timeout());
    });
    let reader = Factory::reader(Factory::generator(), &fake);

    reader.read_all().await.unwrap();

    let log = fake.log();
    let first = log.iter().position(|e| e.starts_with("read 212 ")).unwrap();
    let second = log.iter().rposition(|e| e.starts_with("read 212 ")).unwrap();
    assert_eq!(second, first + 3);
    assert_eq!(log[first + 1], "disconnect");
    assert_eq!(log[first + 2], "connect");

    // the block after the skipped one gets a fresh socket too
    assert_eq!(log[second + 1], "disconnect");
    assert_eq!(log[second + 2], "connect");
    fake.with(|s| {
        assert_eq!(s.connects, 3);
        assert_eq!(s.disconnects, 2);
    });
}

#[tokio::test]
async fn garbled_reply_drops_the_socket_but_exceptions_do_not() {
    common_setup();

    let fake = Fake::new();
    fake.with(|s| {
        s.failing
            .insert(212, Error::Frame("crc mismatch".to_string()));
        s.failing.insert(
            511,
            Error::Exception {
                function: 0x03,
                code: 0x02,
            },
        );
    });
    let reader = Factory::reader(Factory::generator(), &fake);

    reader.read_all().await.unwrap();

    assert_eq!(reads_of(&fake, 212), 2);
    assert_eq!(reads_of(&fake, 511), 1);
    let log = fake.log();
    let exception = log.iter().position(|e| e.starts_with("read 511 ")).unwrap();
    assert!(log.get(exception + 1).map_or(true, |e| e != "disconnect"));
}

#[tokio::test]
async fn dead_link_aborts_the_cycle() {
    common_setup();

    let fake = Fake::new();
    fake.with(|s| {
        s.failing
            .insert(0, Error::Connectivity("connection reset".to_string()));
    });
    let reader = Factory::reader(Factory::generator(), &fake);

    let err = reader.read_all().await.unwrap_err();
    assert!(matches!(err, Error::Connectivity(_)));
    assert_eq!(fake.ops(), vec!["read 0 1".to_string()]);
    fake.with(|s| assert_eq!(s.disconnects, 1));
}

#[tokio::test]
async fn connect_failure() {
    common_setup();

    let fake = Fake::new();
    fake.with(|s| s.connect_error = Some(Error::Connectivity("refused".to_string())));
    let reader = Factory::reader(Factory::generator(), &fake);

    assert!(reader.read_all().await.unwrap_err().is_connectivity());
    assert!(reader.read_registers(0, 1).await.unwrap_err().is_connectivity());
    assert!(fake.ops().is_empty());
}

#[tokio::test]
async fn one_transaction_at_a_time() {
    common_setup();

    let fake = Fake::new();
    fake.with(|s| s.delay = Duration::from_millis(2));
    let reader = Factory::reader(Factory::generator(), &fake);

    let mut handles = Vec::new();
    {
        let reader = reader.clone();
        handles.push(tokio::spawn(async move {
            reader.read_all().await.map(|_| ())
        }));
    }
    for i in 0..5u16 {
        let reader = reader.clone();
        handles.push(tokio::spawn(async move {
            reader.write_register(4000 + i, i).await?;
            reader.read_registers(4000 + i, 1).await.map(|_| ())
        }));
    }
    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    fake.with(|s| {
        assert_eq!(s.max_in_flight, 1);
        assert_eq!(s.ops.len(), hgm9520n_blocks() + 10);
    });
    for i in 0..5u16 {
        assert_eq!(fake.get(4000 + i), i);
    }
}

#[tokio::test]
async fn command_waits_for_the_whole_poll_cycle() {
    common_setup();

    let fake = Fake::new();
    fake.with(|s| s.delay = Duration::from_millis(5));
    let reader = Factory::reader(Factory::generator(), &fake);

    let poll = {
        let reader = reader.clone();
        tokio::spawn(async move { reader.read_all().await })
    };

    // the cycle is under way before the command is issued
    tokio::time::timeout(Duration::from_secs(5), async {
        while fake.ops().is_empty() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();
    reader.write_register(4368, 100).await.unwrap();
    poll.await.unwrap().unwrap();

    let ops = fake.ops();
    let blocks = hgm9520n_blocks();
    assert_eq!(ops.len(), blocks + 1);
    assert!(ops[..blocks].iter().all(|op| op.starts_with("read ")));
    assert_eq!(ops[blocks], "write 4368 100");
}

#[tokio::test]
async fn busy_when_lock_is_held() {
    common_setup();

    let fake = Fake::new();
    fake.with(|s| s.delay = Duration::from_millis(30));
    let reader = Arc::new(Reader::new(
        Factory::generator(),
        fake.transport(),
        Duration::from_millis(20),
        1,
    ));

    let poll = {
        let reader = reader.clone();
        tokio::spawn(async move { reader.read_all().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let err = reader.write_register(4368, 100).await.unwrap_err();
    assert!(err.is_busy());
    assert!(!err.is_connectivity());
    assert!(err.to_string().contains("retry later"));

    poll.await.unwrap().unwrap();
    assert!(!fake.ops().contains(&"write 4368 100".to_string()));
}

#[tokio::test]
async fn batch_write_reports_mismatches() {
    common_setup();

    let fake = Fake::new();
    fake.with(|s| {
        s.ignore_writes.insert(4354);
    });
    fake.set(4354, &[7]);
    let reader = Factory::reader(Factory::ats(), &fake);

    let results = reader
        .write_registers_batch(&[(4352, 500), (4354, 300)], Some((9000, 1234)))
        .await
        .unwrap();

    assert_eq!(
        fake.ops(),
        vec![
            "write 9000 1234",
            "write 4352 500",
            "write 4354 300",
            "read 4352 1",
            "read 4354 1",
        ]
    );
    assert_eq!(results.len(), 2);
    assert!(results[0].verified());
    assert_eq!(results[1].wrote, 300);
    assert_eq!(results[1].read_back, Some(7));
    assert!(!results[1].verified());
}

#[tokio::test]
async fn batch_read_back_failure() {
    common_setup();

    let fake = Fake::new();
    fake.with(|s| {
        s.failing.insert(4352, timeout());
    });
    let reader = Factory::reader(Factory::ats(), &fake);

    let results = reader
        .write_registers_batch(&[(4352, 500), (4354, 300)], None)
        .await
        .unwrap();

    assert_eq!(results[0].read_back, None);
    assert!(!results[0].verified());
    assert!(results[1].verified());
}

#[tokio::test]
async fn invalid_requests_touch_nothing() {
    common_setup();

    let fake = Fake::new();
    let reader = Factory::reader(Factory::ats(), &fake);

    assert!(matches!(
        reader.write_registers_batch(&[], None).await,
        Err(Error::InvalidRequest(_))
    ));
    assert!(matches!(
        reader.read_registers(0, 0).await,
        Err(Error::InvalidRequest(_))
    ));
    assert!(matches!(
        reader.read_registers(0, 126).await,
        Err(Error::InvalidRequest(_))
    ));
    assert!(matches!(
        reader.read_registers_batch(&[(0, 1), (10, 200)]).await,
        Err(Error::InvalidRequest(_))
    ));
    assert!(fake.ops().is_empty());
    fake.with(|s| assert_eq!(s.connects, 0));
}

#[tokio::test]
async fn read_batch_under_one_lock() {
    common_setup();

    let fake = Fake::new();
    fake.set(10, &[1, 2, 3]);
    fake.set(50, &[9]);
    let reader = Factory::reader(Factory::ats(), &fake);

    assert_eq!(
        reader.read_registers_batch(&[(10, 3), (50, 1)]).await.unwrap(),
        vec![vec![1, 2, 3], vec![9]]
    );
}

#[tokio::test]
async fn pulse_coil_sequence() {
    common_setup();

    let fake = Fake::new();
    let reader = Factory::reader(Factory::generator(), &fake);

    reader.pulse_coil(5).await.unwrap();
    assert_eq!(fake.ops(), vec!["coil 5 false", "coil 5 true", "coil 5 false"]);

    reader.write_coil(6, true).await.unwrap();
    assert_eq!(fake.ops().last().unwrap(), "coil 6 true");
}

#[tokio::test]
async fn command_failure_reconnects() {
    common_setup();

    let fake = Fake::new();
    fake.with(|s| {
        s.failing
            .insert(100, Error::Connectivity("broken pipe".to_string()));
    });
    let reader = Factory::reader(Factory::generator(), &fake);

    assert!(reader.read_registers(100, 1).await.is_err());
    fake.with(|s| assert_eq!(s.disconnects, 1));

    reader.read_registers(101, 1).await.unwrap();
    fake.with(|s| assert_eq!(s.connects, 2));
}
