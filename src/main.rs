//! Command-line front end: read an input file, run the ensemble, and write
//! the aggregate tables into the output folder. All physics lives in the
//! library; this binary only handles files.

// std
use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

// others
use anyhow::{Context, Result};
use log::info;
use structopt::StructOpt;

// phonoray
use phonoray::config::Config;
use phonoray::core::base::Float;
use phonoray::core::film::{Film, Histogram};
use phonoray::integrators::{Simulation, SimulationResults};

#[derive(StructOpt)]
#[structopt(
    name = "phonoray",
    about = "Monte Carlo phonon transport in nanostructured membranes"
)]
struct Cli {
    /// Input file with the simulation parameters (JSON). Runs a demo
    /// simulation when omitted.
    #[structopt(parse(from_os_str))]
    input_file: Option<PathBuf>,
    /// Run in MFP sampling mode: sweep the dispersion and integrate the
    /// thermal conductivity.
    #[structopt(short = "s", long = "sampling")]
    sampling: bool,
    /// Folder for the output tables.
    #[structopt(short = "o", long = "output", default_value = "results")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::from_args();

    let cfg: Config = match &cli.input_file {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open input file {}", path.display()))?;
            serde_json::from_reader(file)
                .with_context(|| format!("cannot parse input file {}", path.display()))?
        }
        None => {
            info!("no input file provided, running a demo simulation");
            Config::default()
        }
    };

    let simulation = Simulation::new(cfg).context("invalid configuration")?;
    let start = Instant::now();
    let results = if cli.sampling {
        simulation.run_sweep()
    } else {
        simulation.run()
    };
    let elapsed = start.elapsed();

    fs::create_dir_all(&cli.output)
        .with_context(|| format!("cannot create output folder {}", cli.output.display()))?;
    write_sequences(&cli.output, &results.film)?;
    write_thermal_map(&cli.output, &results.film)?;
    write_profiles(&cli.output, &results.film)?;
    write_distributions(&cli.output, &results.film, simulation.cfg.number_of_nodes)?;
    write_statistics(&cli.output, &results.film)?;
    if let Some(conductivity) = &results.conductivity {
        write_conductivity(&cli.output, conductivity)?;
        println!("thermal conductivity = {:.2} W/m/K", conductivity.total);
    }
    write_information(&cli.output, &simulation, &results, elapsed.as_secs())?;

    println!(
        "{:.1}% of phonons reached the cold side ({} flights failed)",
        100.0 * results.exit_fraction(),
        results.film.failed_flights
    );
    println!("results written to {}", cli.output.display());
    Ok(())
}

fn write_column(path: &Path, values: &[Float]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for value in values {
        writeln!(out, "{:e}", value)?;
    }
    Ok(())
}

fn write_sequences(folder: &Path, film: &Film) -> Result<()> {
    write_column(&folder.join("free_paths.csv"), &film.free_paths)?;
    write_column(
        &folder.join("free_paths_along_y.csv"),
        &film.free_paths_along_y,
    )?;
    write_column(&folder.join("frequencies.csv"), &film.frequencies)?;
    write_column(&folder.join("group_velocities.csv"), &film.group_velocities)?;
    write_column(&folder.join("initial_angles.csv"), &film.initial_thetas)?;
    write_column(&folder.join("exit_angles.csv"), &film.exit_thetas)?;
    write_column(&folder.join("travel_times.csv"), &film.travel_times)?;
    for (index, sequence) in film.detected_frequencies.iter().enumerate() {
        write_column(
            &folder.join(format!("detected_frequencies_{}.csv", index + 1)),
            sequence,
        )?;
    }
    Ok(())
}

fn write_thermal_map(folder: &Path, film: &Film) -> Result<()> {
    let (pixels_x, pixels_y) = film.pixel_counts();
    let mut out = BufWriter::new(File::create(folder.join("thermal_map.csv"))?);
    for row in 0..pixels_y {
        let line: Vec<String> = (0..pixels_x)
            .map(|col| format!("{:e}", film.thermal_map[row * pixels_x + col]))
            .collect();
        writeln!(out, "{}", line.join(","))?;
    }
    Ok(())
}

fn write_profile(path: &Path, profile: &[Float], pixels: usize, frames: usize) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for pixel in 0..pixels {
        let line: Vec<String> = (0..frames)
            .map(|frame| format!("{:e}", profile[pixel * frames + frame]))
            .collect();
        writeln!(out, "{}", line.join(","))?;
    }
    Ok(())
}

fn write_profiles(folder: &Path, film: &Film) -> Result<()> {
    let (pixels_x, pixels_y) = film.pixel_counts();
    let frames = film.frame_count();
    write_profile(
        &folder.join("heat_flux_profile_x.csv"),
        &film.heat_flux_x,
        pixels_x,
        frames,
    )?;
    write_profile(
        &folder.join("heat_flux_profile_y.csv"),
        &film.heat_flux_y,
        pixels_y,
        frames,
    )?;
    write_profile(
        &folder.join("temperature_profile_x.csv"),
        &film.temperature_x,
        pixels_x,
        frames,
    )?;
    write_profile(
        &folder.join("temperature_profile_y.csv"),
        &film.temperature_y,
        pixels_y,
        frames,
    )?;
    let effective = film.effective_conductivity();
    write_column(&folder.join("effective_conductivity.csv"), &effective)?;
    Ok(())
}

fn write_histogram(path: &Path, histogram: &Histogram) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for (center, count) in histogram.centers.iter().zip(histogram.counts.iter()) {
        writeln!(out, "{:e},{}", center, count)?;
    }
    Ok(())
}

fn write_distributions(folder: &Path, film: &Film, bins: usize) -> Result<()> {
    let wavelengths: Vec<Float> = film
        .group_velocities
        .iter()
        .zip(film.frequencies.iter())
        .map(|(v, f)| v / f)
        .collect();
    write_histogram(
        &folder.join("distribution_of_exit_angles.csv"),
        &Histogram::from_samples(&film.exit_thetas, bins),
    )?;
    write_histogram(
        &folder.join("distribution_of_initial_angles.csv"),
        &Histogram::from_samples(&film.initial_thetas, bins),
    )?;
    write_histogram(
        &folder.join("distribution_of_free_paths.csv"),
        &Histogram::from_samples(&film.free_paths, bins),
    )?;
    write_histogram(
        &folder.join("distribution_of_frequencies.csv"),
        &Histogram::from_samples(&film.frequencies, bins),
    )?;
    write_histogram(
        &folder.join("distribution_of_wavelengths.csv"),
        &Histogram::from_samples(&wavelengths, bins),
    )?;
    write_histogram(
        &folder.join("distribution_of_travel_times.csv"),
        &Histogram::from_samples(&film.travel_times, bins),
    )?;
    Ok(())
}

fn write_statistics(folder: &Path, film: &Film) -> Result<()> {
    let stats = &film.statistics;
    let total = stats.total().max(1) as Float;
    let percent = |n: u64| 100.0 * n as Float / total;
    let mut out = BufWriter::new(File::create(folder.join("scattering_statistics.txt"))?);
    writeln!(out, "total scattering events: {}", stats.total())?;
    writeln!(
        out,
        "side walls:      {:.2}% diffuse, {:.2}% specular",
        percent(stats.wall_diffuse),
        percent(stats.wall_specular)
    )?;
    writeln!(
        out,
        "top and bottom:  {:.2}% diffuse, {:.2}% specular",
        percent(stats.top_bottom_diffuse),
        percent(stats.top_bottom_specular)
    )?;
    writeln!(
        out,
        "holes:           {:.2}% diffuse, {:.2}% specular",
        percent(stats.hole_diffuse),
        percent(stats.hole_specular)
    )?;
    writeln!(
        out,
        "pillars:         {:.2}% diffuse, {:.2}% specular",
        percent(stats.pillar_diffuse),
        percent(stats.pillar_specular)
    )?;
    writeln!(out, "rethermalization: {:.2}%", percent(stats.rethermalization))?;
    writeln!(out, "internal:         {:.2}%", percent(stats.internal))?;
    Ok(())
}

fn write_conductivity(
    folder: &Path,
    conductivity: &phonoray::core::film::ConductivityIntegral,
) -> Result<()> {
    let mut out = BufWriter::new(File::create(folder.join("thermal_conductivity.csv"))?);
    writeln!(out, "# total {:e} W/m/K", conductivity.total)?;
    for contribution in &conductivity.contributions {
        writeln!(
            out,
            "{},{:e},{:e}",
            contribution.branch, contribution.wavelength, contribution.conductivity
        )?;
    }
    Ok(())
}

fn write_information(
    folder: &Path,
    simulation: &Simulation,
    results: &SimulationResults,
    elapsed_seconds: u64,
) -> Result<()> {
    let cfg = &simulation.cfg;
    let mut out = BufWriter::new(File::create(folder.join("information.txt"))?);
    writeln!(out, "simulation took {} s", elapsed_seconds)?;
    writeln!(out, "number of phonons = {}", cfg.number_of_phonons)?;
    writeln!(out, "number of timesteps = {}", cfg.number_of_timesteps)?;
    writeln!(out, "timestep = {:e} s", cfg.timestep)?;
    writeln!(out, "temperature = {} K", cfg.temperature)?;
    writeln!(out, "media = {}", simulation.material.tag)?;
    writeln!(
        out,
        "dimensions = {:e} x {:e} x {:e} m",
        cfg.width, cfg.length, cfg.thickness
    )?;
    writeln!(
        out,
        "roughness (wall/hole/pillar/top/bottom) = {:e}/{:e}/{:e}/{:e}/{:e} m",
        cfg.side_wall_roughness,
        cfg.hole_roughness,
        cfg.pillar_roughness,
        cfg.top_roughness,
        cfg.bottom_roughness
    )?;
    writeln!(out, "obstacles = {}", cfg.obstacles.len())?;
    writeln!(
        out,
        "{:.1}% of phonons reached the cold side",
        100.0 * results.exit_fraction()
    )?;
    writeln!(out, "failed flights = {}", results.film.failed_flights)?;
    Ok(())
}
