//! Synthetic sensor files shaped like the weight-lifting exercise data

#![allow(dead_code)]

use std::fmt::Write as _;
use std::io::Write as _;
use tempfile::NamedTempFile;

pub const CLASSES: [&str; 5] = ["A", "B", "C", "D", "E"];
pub const FEATURES: [&str; 4] = ["roll_belt", "pitch_belt", "yaw_belt", "gyros_belt_x"];

const HEADER: &str = "X,user_name,raw_timestamp_part_1,new_window,num_window,\
roll_belt,pitch_belt,yaw_belt,gyros_belt_x,kurtosis_roll_belt,constant_sensor";

/// Deterministic noise in [0, 1)
fn jitter(i: usize, salt: usize) -> f64 {
    ((i * 37 + salt * 11) % 13) as f64 / 13.0
}

fn sensor_values(class_idx: usize, i: usize) -> String {
    let c = class_idx as f64;
    format!(
        "{:.4},{:.4},{:.4},{:.4}",
        c * 10.0 + jitter(i, 1),
        -5.0 * c + jitter(i, 2),
        (c * 3.0).sin() * 20.0 + jitter(i, 3),
        jitter(i, 4) - 0.5
    )
}

/// `per_class` labelled rows per class plus `summary_rows` window summaries
pub fn training_csv(per_class: usize, summary_rows: usize) -> NamedTempFile {
    let mut body = format!("{},classe\n", HEADER);
    let mut row = 1;
    for i in 0..per_class {
        for (class_idx, class) in CLASSES.iter().enumerate() {
            let user = ["carlitos", "pedro", "adelmo"][row % 3];
            writeln!(
                body,
                "{},{},{},no,{},{},NA,1.0,{}",
                row,
                user,
                1_322_000_000 + row,
                i / 4,
                sensor_values(class_idx, row),
                class
            )
            .unwrap();
            row += 1;
        }
    }
    for s in 0..summary_rows {
        let class_idx = s % CLASSES.len();
        writeln!(
            body,
            "{},pedro,{},yes,{},{},#DIV/0!,1.0,{}",
            row,
            1_322_000_000 + row,
            s,
            sensor_values(class_idx, row),
            CLASSES[class_idx]
        )
        .unwrap();
        row += 1;
    }
    write_csv(&body)
}

/// Unlabelled rows; row `k` is generated from class `k % 5`
pub fn test_csv(n_rows: usize) -> NamedTempFile {
    let mut body = format!("{},problem_id\n", HEADER);
    for k in 0..n_rows {
        writeln!(
            body,
            "{},jeremy,{},no,1,{},NA,1.0,{}",
            k + 1,
            1_323_000_000 + k,
            sensor_values(k % CLASSES.len(), 500 + k),
            k + 1
        )
        .unwrap();
    }
    write_csv(&body)
}

pub fn write_csv(body: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
