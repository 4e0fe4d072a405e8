//! Integration tests for device discovery and accessory negotiation
//!
//! Runs the enumerator, matcher and AOA handshake against in-memory devices:
//! - ADB interface detection at any configuration depth
//! - Serial and vid:pid lookups
//! - Capacity bound and reference release
//! - Handshake ordering and the version gate

use common::Error;
use protocol::{
    ADB_INTERFACE, AOA_GET_PROTOCOL, AOA_SET_AUDIO_MODE, AOA_START_ACCESSORY, AoaVersion,
    InterfaceSignature, LookupCriterion, UsbId,
};
use proptest::prelude::*;
use usbaudio::test_utils::{FakeBus, FakeDevice};
use usbaudio::usb::{UsbCandidate, has_adb_interface, matches};
use usbaudio::{MAX_DEVICES, enable_accessory_audio, find_devices, select_device};

fn adb_phone(serial: &str) -> FakeDevice {
    FakeDevice::new(0x18D1, 0x4EE7)
        .with_configuration(vec![
            InterfaceSignature::new(0xFF, 0xFF, 0x00),
            ADB_INTERFACE,
        ])
        .with_serial(serial)
}

fn signature() -> impl Strategy<Value = InterfaceSignature> {
    (any::<u8>(), any::<u8>(), any::<u8>())
        .prop_map(|(class, subclass, protocol)| InterfaceSignature::new(class, subclass, protocol))
}

mod matcher {
    use super::*;

    proptest! {
        #[test]
        fn prop_adb_detected_at_any_depth(
            configs in prop::collection::vec(prop::collection::vec(signature(), 0..4), 1..4),
            config_pick in any::<prop::sample::Index>(),
            slot_pick in any::<prop::sample::Index>(),
        ) {
            let mut configs = configs;
            let config = config_pick.index(configs.len());
            let slot = slot_pick.index(configs[config].len() + 1);
            configs[config].insert(slot, ADB_INTERFACE);

            let device = configs
                .into_iter()
                .fold(FakeDevice::new(1, 2), |device, config| device.with_configuration(config));
            let summary = device.summary().unwrap();

            prop_assert!(has_adb_interface(&device, &summary));
        }

        #[test]
        fn prop_adb_absent_never_matches(
            configs in prop::collection::vec(
                prop::collection::vec(signature().prop_filter("not adb", |s| *s != ADB_INTERFACE), 0..4),
                0..4,
            ),
        ) {
            let device = configs
                .into_iter()
                .fold(FakeDevice::new(1, 2), |device, config| device.with_configuration(config));
            let summary = device.summary().unwrap();

            prop_assert!(!matches(&LookupCriterion::AdbInterface, &device, &summary));
        }

        #[test]
        fn prop_different_serial_never_matches(a in "[A-Za-z0-9]{1,16}", b in "[A-Za-z0-9]{1,16}") {
            prop_assume!(a != b);
            let device = FakeDevice::new(1, 2).with_serial(&b);
            let summary = device.summary().unwrap();

            prop_assert!(!matches(&LookupCriterion::Serial(a), &device, &summary));
        }
    }
}

mod enumeration {
    use super::*;

    #[test]
    fn test_vid_pid_single_match() {
        let bus = FakeBus::new(vec![
            FakeDevice::new(0x046D, 0xC52B).with_serial("MOUSE"),
            FakeDevice::new(0x18D1, 0x2D05).with_serial("XYZ"),
            FakeDevice::new(0x18D1, 0x4EE7).with_serial("OTHER"),
        ]);

        let found = find_devices(
            &bus,
            &LookupCriterion::VidPid(UsbId::new(0x18D1, 0x2D05)),
            MAX_DEVICES,
        )
        .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].serial, "XYZ");
        assert_eq!(found[0].vendor_id, 0x18D1);
        assert_eq!(found[0].product_id, 0x2D05);
    }

    #[test]
    fn test_serial_lookup() {
        let bus = FakeBus::new(vec![adb_phone("AAA"), adb_phone("BBB")]);

        let found = find_devices(&bus, &LookupCriterion::Serial("BBB".into()), MAX_DEVICES).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].serial, "BBB");
    }

    #[test]
    fn test_unreadable_serial_skipped_not_fatal() {
        let bus = FakeBus::new(vec![
            FakeDevice::new(0x18D1, 0x4EE7)
                .with_configuration(vec![ADB_INTERFACE])
                .with_unreadable_serial("AAA"),
            adb_phone("BBB"),
        ]);

        let found = find_devices(&bus, &LookupCriterion::AdbInterface, MAX_DEVICES).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].serial, "BBB");
    }

    #[test]
    fn test_enumeration_failure() {
        let bus = FakeBus::failing(rusb::Error::Access);

        assert!(matches!(
            find_devices(&bus, &LookupCriterion::AdbInterface, MAX_DEVICES),
            Err(Error::Enumeration(rusb::Error::Access))
        ));
    }

    #[test]
    fn test_records_release_references_once() {
        let phone = adb_phone("AAA");
        let bus = FakeBus::new(vec![phone.clone()]);
        assert_eq!(phone.live_references(), 2);

        let found = find_devices(&bus, &LookupCriterion::AdbInterface, MAX_DEVICES).unwrap();
        assert_eq!(phone.live_references(), 3);

        for record in found {
            record.close();
        }
        assert_eq!(phone.live_references(), 2);
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_capacity(count in 0usize..12, capacity in 0usize..8) {
            let devices = (0..count).map(|i| adb_phone(&format!("SN{}", i))).collect();
            let bus = FakeBus::new(devices);

            let found = find_devices(&bus, &LookupCriterion::AdbInterface, capacity).unwrap();
            prop_assert_eq!(found.len(), count.min(capacity));
        }
    }
}

mod negotiation {
    use super::*;

    #[test]
    fn test_end_to_end_negotiation() {
        let phone = adb_phone("AAA").with_aoa_version(2);
        let bus = FakeBus::new(vec![phone.clone()]);

        let (device, version) =
            enable_accessory_audio(&bus, &LookupCriterion::AdbInterface, MAX_DEVICES).unwrap();

        assert_eq!(device.serial, "AAA");
        assert_eq!(version, AoaVersion(2));
        assert_eq!(
            phone.requests(),
            [AOA_GET_PROTOCOL, AOA_SET_AUDIO_MODE, AOA_START_ACCESSORY]
        );
        device.close();
    }

    #[test]
    fn test_ambiguous_match_negotiates_nothing() {
        let first = adb_phone("AAA");
        let second = adb_phone("BBB");
        let bus = FakeBus::new(vec![first.clone(), second.clone()]);

        let result = enable_accessory_audio(&bus, &LookupCriterion::AdbInterface, MAX_DEVICES);

        assert!(matches!(result, Err(Error::AmbiguousMatch(ref list)) if list.len() == 2));
        assert!(first.requests().is_empty());
        assert!(second.requests().is_empty());
    }

    #[test]
    fn test_no_match_negotiates_nothing() {
        let bus = FakeBus::new(vec![FakeDevice::new(0x046D, 0xC52B)]);

        assert!(matches!(
            select_device(&bus, &LookupCriterion::AdbInterface, MAX_DEVICES),
            Err(Error::NoMatch(_))
        ));
    }

    #[test]
    fn test_start_accessory_failure() {
        let phone = adb_phone("AAA").failing_request(AOA_START_ACCESSORY, rusb::Error::NoDevice);
        let bus = FakeBus::new(vec![phone.clone()]);

        let result = enable_accessory_audio(&bus, &LookupCriterion::AdbInterface, MAX_DEVICES);

        assert!(matches!(
            result,
            Err(Error::AccessoryStart(rusb::Error::NoDevice))
        ));
        assert_eq!(phone.live_references(), 2);
    }

    #[test]
    fn test_protocol_query_failure() {
        let phone = adb_phone("AAA").failing_request(AOA_GET_PROTOCOL, rusb::Error::Pipe);
        let bus = FakeBus::new(vec![phone.clone()]);

        let result = enable_accessory_audio(&bus, &LookupCriterion::AdbInterface, MAX_DEVICES);

        assert!(matches!(result, Err(Error::ProtocolQuery(_))));
        assert_eq!(phone.requests(), [AOA_GET_PROTOCOL]);
    }

    proptest! {
        #[test]
        fn prop_old_versions_stop_after_query(version in 0u16..2) {
            let phone = adb_phone("AAA").with_aoa_version(version);
            let bus = FakeBus::new(vec![phone.clone()]);

            let result = enable_accessory_audio(&bus, &LookupCriterion::AdbInterface, MAX_DEVICES);

            prop_assert!(matches!(result, Err(Error::UnsupportedProtocol(v)) if v == version));
            prop_assert_eq!(phone.requests(), vec![AOA_GET_PROTOCOL]);
        }

        #[test]
        fn prop_supported_versions_run_full_sequence(version in 2u16..=u16::MAX) {
            let phone = adb_phone("AAA").with_aoa_version(version);
            let bus = FakeBus::new(vec![phone.clone()]);

            let (device, reported) =
                enable_accessory_audio(&bus, &LookupCriterion::AdbInterface, MAX_DEVICES).unwrap();

            prop_assert_eq!(reported, AoaVersion(version));
            prop_assert_eq!(
                phone.requests(),
                vec![AOA_GET_PROTOCOL, AOA_SET_AUDIO_MODE, AOA_START_ACCESSORY]
            );
            device.close();
        }
    }
}
