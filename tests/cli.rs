use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::Result;
use assert_cmd::prelude::*;
use opencv::core::{CV_8UC1, Mat, Scalar, Vector};
use opencv::imgcodecs;
use opencv::prelude::*;
use predicates::prelude::*;

macro_rules! cargo_run {
    ($cmd:expr, $($args:expr),*) => {
        {
            let mut cmd = Command::cargo_bin($cmd)?;
            $(cmd.arg($args);)*
            cmd.assert()
        }
    };
}

fn write_noise_png(path: &Path, seed: u64) -> Result<Vec<u8>> {
    let mut img = Mat::new_rows_cols_with_default(256, 256, CV_8UC1, Scalar::all(0.))?;
    let mut state = seed.wrapping_mul(0x9E3779B97F4A7C15).wrapping_add(1);
    for y in 0..256 {
        for x in 0..256 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            *img.at_2d_mut::<u8>(y, x)? = (state >> 56) as u8;
        }
    }
    let mut buf = Vector::<u8>::new();
    imgcodecs::imencode_def(".png", &img, &mut buf)?;
    let bytes = buf.to_vec();
    fs::write(path, &bytes)?;
    Ok(bytes)
}

#[test]
fn run_dedups_a_directory() -> Result<()> {
    let dir = assert_fs::TempDir::new()?;
    let a = write_noise_png(&dir.path().join("a.png"), 1)?;
    fs::write(dir.path().join("a_copy.png"), &a)?;
    write_noise_png(&dir.path().join("b.png"), 2)?;

    cargo_run!("imdedup", "run", dir.path(), "--output-format", "json")
        .success()
        .stdout(predicate::str::contains("a.png"))
        .stdout(predicate::str::contains("b.png"))
        .stdout(predicate::str::contains("\"excluded\": 1"));

    Ok(())
}

#[test]
fn run_copies_unique_images() -> Result<()> {
    let dir = assert_fs::TempDir::new()?;
    let out = assert_fs::TempDir::new()?;
    write_noise_png(&dir.path().join("a.png"), 3)?;
    write_noise_png(&dir.path().join("b.png"), 4)?;

    cargo_run!("imdedup", "run", dir.path(), "-o", out.path()).success();

    let unique = out.path().join("unique");
    assert!(unique.join("a.png").exists());
    assert!(unique.join("b.png").exists());

    Ok(())
}

#[test]
fn compare_reports_identical_images_as_similar() -> Result<()> {
    let dir = assert_fs::TempDir::new()?;
    let img1 = dir.path().join("x1.png");
    let img2 = dir.path().join("x2.png");
    write_noise_png(&img1, 5)?;
    write_noise_png(&img2, 5)?;

    cargo_run!("imdedup", "compare", &img1, &img2)
        .success()
        .stdout(predicate::str::contains("similar\ttrue"));

    Ok(())
}

#[test]
fn invalid_threshold_fails_fast() -> Result<()> {
    let dir = assert_fs::TempDir::new()?;
    write_noise_png(&dir.path().join("a.png"), 6)?;

    cargo_run!("imdedup", "run", dir.path(), "-k", "0").failure();

    Ok(())
}
