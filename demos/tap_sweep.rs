use shiftmix::{
    cipher_round_matrix, exponent_sweep, perfection_sweep, ExperimentConfig, PerfectionParams,
    SubstitutionTable, MixingStructure,
};

const EXPERIMENT: &str = r#"{
    "cell_width": 4, "cells": 5, "taps": [0, 2, 4],
    "combiner": "add",
    "transform": { "kind": "present" },
    "max_rounds": 20, "samples": 32, "seed": 1,
    "local_columns": { "start": 16, "end": 20 }
}"#;

fn main() -> shiftmix::Result<()> {
    let round = cipher_round_matrix(32)?;
    let records = exponent_sweep(32, 6, 2, &round, 60)?;
    println!("Speck32 registers, n = 6, three taps:");
    println!("{}", serde_json::to_string_pretty(&records)?);

    let sbox = SubstitutionTable::present();
    let params = PerfectionParams::new(32, 20);
    let records = perfection_sweep(4, 6, 1, &sbox, &params, 2024)?;
    println!("PRESENT registers, n = 6, two taps (perfection):");
    println!("{}", serde_json::to_string_pretty(&records)?);
    println!("PRESENT matrix:\n{}", sbox.mixing_matrix());

    let report = ExperimentConfig::from_json(EXPERIMENT)?.run()?;
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
