//! Regenerates `assets/sample_data.csv`: a small adhesive pull-test dataset
//! with two adhesive groups, used by the demo and the integration tests.

use std::path::Path;

use anyhow::{Context, Result};

struct PullTest {
    adhesive: &'static str,
    test_case: &'static str,
    temperature: f64,
    loads: [f64; 6],
}

const TESTS: [PullTest; 2] = [
    PullTest {
        adhesive: "Fuller",
        test_case: "RT",
        temperature: 25.0,
        loads: [150.0, 310.0, 450.0, 620.0, 780.0, 900.0],
    },
    PullTest {
        adhesive: "Sika",
        test_case: "Cold",
        temperature: -40.0,
        loads: [120.0, 250.0, 380.0, 510.0, 630.0, 740.0],
    },
];

fn main() -> Result<()> {
    let path = Path::new("assets/sample_data.csv");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("creating assets directory")?;
    }

    let mut writer = csv::Writer::from_path(path).context("opening output file")?;
    writer.write_record([
        "Displacement",
        "Pull Load (N)",
        "Temperature (C)",
        "Adhesive",
        "Test Case",
    ])?;

    for test in &TESTS {
        for (i, load) in test.loads.iter().enumerate() {
            let displacement = (i + 1) as f64 * 0.1;
            writer.write_record([
                format!("{displacement:.1}"),
                format!("{load}"),
                format!("{}", test.temperature),
                test.adhesive.to_string(),
                test.test_case.to_string(),
            ])?;
        }
    }

    writer.flush().context("writing CSV")?;
    println!("Wrote {}", path.display());
    Ok(())
}
