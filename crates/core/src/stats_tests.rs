// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::model::{InputInterface, OutputInterface};

fn instance_with_one_of_each() -> Instance {
    let mut inst = Instance::new("i", vec!["i".to_string()]);
    inst.input_interfaces.push(InputInterface::new("a"));
    inst.output_interfaces.push(OutputInterface::new("b"));
    inst
}

#[test]
fn literal_json_from_the_stats_happy_path_scenario_parses_and_applies() {
    let json = r#"{"in_cnt":1,"out_cnt":1,"in":[{"ifc_id":"a","messages":10,"buffers":2,"ifc_type":116,"ifc_state":1}],"out":[{"ifc_id":"b","sent-messages":20,"dropped-messages":0,"buffers":3,"autoflushes":0,"num_clients":1,"type":117}]}"#;
    let payload: StatsPayload = serde_json::from_str(json).unwrap();
    let mut instance = instance_with_one_of_each();
    apply_stats(&mut instance, &payload).unwrap();

    assert_eq!(instance.input_interfaces[0].recv_msg, 10);
    assert_eq!(instance.input_interfaces[0].recv_buf, 2);
    assert_eq!(instance.input_interfaces[0].ifc_type, 116);
    assert_eq!(instance.input_interfaces[0].ifc_state, 1);

    assert_eq!(instance.output_interfaces[0].sent_msg, 20);
    assert_eq!(instance.output_interfaces[0].dropped_msg, 0);
    assert_eq!(instance.output_interfaces[0].sent_buf, 3);
    assert_eq!(instance.output_interfaces[0].num_clients, 1);
}

#[test]
fn in_count_mismatch_leaves_instance_unchanged() {
    let mut instance = instance_with_one_of_each();
    let before = instance.input_interfaces.clone();
    let payload = StatsPayload {
        in_cnt: 2,
        out_cnt: 1,
        in_stats: vec![],
        out_stats: vec![],
    };
    let err = apply_stats(&mut instance, &payload).unwrap_err();
    assert_eq!(
        err,
        StatsApplyError::InCountMismatch {
            configured: 1,
            reported: 2
        }
    );
    assert_eq!(instance.input_interfaces, before);
}

#[test]
fn array_longer_than_declared_count_is_rejected() {
    let mut instance = instance_with_one_of_each();
    let payload = StatsPayload {
        in_cnt: 1,
        out_cnt: 1,
        in_stats: vec![
            InputIfcStats {
                ifc_id: "a".into(),
                messages: 1,
                buffers: 1,
                ifc_type: 1,
                ifc_state: 1,
            },
            InputIfcStats {
                ifc_id: "extra".into(),
                messages: 1,
                buffers: 1,
                ifc_type: 1,
                ifc_state: 1,
            },
        ],
        out_stats: vec![],
    };
    let err = apply_stats(&mut instance, &payload).unwrap_err();
    assert_eq!(
        err,
        StatsApplyError::InArrayOverflow {
            configured: 1,
            reported: 2
        }
    );
}
