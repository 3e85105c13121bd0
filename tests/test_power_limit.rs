mod common;
use common::*;

use smartgen_bridge::commands::power_limit::{
    load_mode_text, PowerLimit, ReadPowerLimit, SetPowerLimit,
};

#[tokio::test]
async fn read_generator_limits() {
    common_setup();

    let fake = Fake::new();
    fake.set(159, &[500, 1000, (-100i16) as u16, 0]);
    let reader = Factory::reader(Factory::generator(), &fake);

    let limit = ReadPowerLimit::new(reader).run().await.unwrap();
    assert_eq!(
        limit,
        PowerLimit::Generator {
            current_p_pct: 50.0,
            target_p_pct: 100.0,
            current_q_pct: -10.0,
            target_q_pct: 0.0,
            config_p_raw: 1000,
            config_q_raw: 0,
        }
    );
    assert_eq!(fake.ops(), vec!["read 159 4"]);

    let json = serde_json::to_value(&limit).unwrap();
    assert_eq!(json["device_type"], "generator");
    assert_eq!(json["target_p_pct"], 100.0);
}

#[tokio::test]
async fn read_ats_limits() {
    common_setup();

    let fake = Fake::new();
    fake.set(4351, &[1, 800]);
    fake.set(4354, &[300]);
    let reader = Factory::reader(Factory::ats(), &fake);

    let limit = ReadPowerLimit::new(reader).run().await.unwrap();
    assert_eq!(
        limit,
        PowerLimit::Ats {
            load_mode: 1,
            load_mode_text: "Mains Control".to_string(),
            config_p_raw: 800,
            config_q_raw: 300,
        }
    );
}

#[test]
fn load_modes() {
    assert_eq!(load_mode_text(0), "Gen Control");
    assert_eq!(load_mode_text(2), "Load Reception");
    assert_eq!(load_mode_text(7), "unknown_7");
}

#[tokio::test]
async fn set_generator_limits() {
    common_setup();

    let fake = Fake::new();
    let reader = Factory::reader(Factory::generator(), &fake);

    let result = SetPowerLimit::new(reader, Some((9000, 1234)), 750, 200, None)
        .run()
        .await
        .unwrap();

    assert!(result.verified);
    assert_eq!(result.device_id, 1);
    assert_eq!(
        fake.ops(),
        vec![
            "write 9000 1234",
            "write 4368 750",
            "write 4370 200",
            "read 4368 1",
            "read 4370 1",
        ]
    );
}

#[tokio::test]
async fn set_uses_configured_unlock() {
    common_setup();

    let fake = Fake::new();
    let reader = Factory::reader(Factory::generator(), &fake);
    let config = ConfigWrapper::from_config(
        Config::from_yaml(
            "redis:\n  enabled: false\ncommands:\n  unlock_register: 9000\n  unlock_value: 1234\n",
        )
        .unwrap(),
    );

    SetPowerLimit::from_config(&config, reader.clone(), 600, 100, None)
        .run()
        .await
        .unwrap();
    assert_eq!(fake.ops()[0], "write 9000 1234");

    // nothing configured, nothing written ahead of the setpoints
    let fake = Fake::new();
    let reader = Factory::reader(Factory::generator(), &fake);
    SetPowerLimit::from_config(&Factory::config(), reader, 600, 100, None)
        .run()
        .await
        .unwrap();
    assert_eq!(fake.ops()[0], "write 4368 600");
}

#[tokio::test]
async fn set_ats_limits_with_load_mode() {
    common_setup();

    let fake = Fake::new();
    fake.with(|s| {
        s.ignore_writes.insert(4354);
    });
    let reader = Factory::reader(Factory::ats(), &fake);

    let result = SetPowerLimit::new(reader, None, 1000, 500, Some(2))
        .run()
        .await
        .unwrap();

    assert!(!result.verified);
    let addresses: Vec<u16> = result.verifications.iter().map(|v| v.address).collect();
    assert_eq!(addresses, vec![4351, 4352, 4354]);
    assert!(result.verifications[0].verified());
    assert_eq!(result.verifications[2].read_back, Some(0));
    assert_eq!(fake.get(4351), 2);
}

#[tokio::test]
async fn rejects_bad_arguments() {
    common_setup();

    let fake = Fake::new();
    let generator = Factory::reader(Factory::generator(), &fake);
    let ats = Factory::reader(Factory::ats(), &fake);

    let cases = [
        SetPowerLimit::new(generator.clone(), None, 1001, 0, None),
        SetPowerLimit::new(generator.clone(), None, 0, 1001, None),
        SetPowerLimit::new(generator, None, 500, 500, Some(0)),
        SetPowerLimit::new(ats, None, 500, 500, Some(3)),
    ];
    for command in cases {
        assert!(matches!(command.run().await, Err(Error::InvalidRequest(_))));
    }
    assert!(fake.ops().is_empty());
}
