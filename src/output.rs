use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::annotation::AnnotationTable;
use crate::error::KiraError;
use crate::kegg::ReferenceTable;
use crate::matrix::{CountMatrix, ModuleCount};
use crate::metadata::SampleGroup;
use crate::plot::Figure;

pub const MAX_DPI: u32 = 2400;

/// A table that can be written as CSV, row index first.
pub trait CsvTable {
    fn header(&self) -> Vec<String>;
    fn write_records<W: Write>(&self, out: &mut csv::Writer<W>) -> csv::Result<()>;
}

/// Write `<out_dir>/<name>.csv`, creating `out_dir` if needed.
pub fn save_csv<T: CsvTable + ?Sized>(
    table: &T,
    out_dir: &Path,
    name: &str,
) -> Result<PathBuf, KiraError> {
    fs::create_dir_all(out_dir)
        .map_err(|err| KiraError::Filesystem(format!("create {}: {err}", out_dir.display())))?;
    let path = out_dir.join(format!("{name}.csv"));
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(table.header())?;
    table.write_records(&mut writer)?;
    writer
        .flush()
        .map_err(|err| KiraError::Filesystem(format!("write {}: {err}", path.display())))?;
    info!("CSV saved in: {}", path.display());
    Ok(path)
}

/// Render `figure` to `<out_dir>/<name>.png` at `dpi`. The figure is consumed.
pub fn save_plot<F: Figure>(
    figure: F,
    out_dir: &Path,
    name: &str,
    dpi: u32,
) -> Result<PathBuf, KiraError> {
    if !(1..=MAX_DPI).contains(&dpi) {
        return Err(KiraError::Plot(format!("dpi must be in 1..={MAX_DPI}, got {dpi}")));
    }
    fs::create_dir_all(out_dir)
        .map_err(|err| KiraError::Filesystem(format!("create {}: {err}", out_dir.display())))?;
    let path = out_dir.join(format!("{name}.png"));
    let (w_in, h_in) = figure.size_inches();
    let size = (
        (w_in * dpi as f64).round().max(1.0) as u32,
        (h_in * dpi as f64).round().max(1.0) as u32,
    );

    {
        let canvas = BitMapBackend::new(&path, size).into_drawing_area();
        canvas
            .fill(&WHITE)
            .map_err(|err| KiraError::Plot(err.to_string()))?;
        figure.render(&canvas)?;
        canvas
            .present()
            .map_err(|err| KiraError::Plot(err.to_string()))?;
    }

    info!("Figure saved in: {}", path.display());
    Ok(path)
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }

    pub fn save<T: Serialize>(value: &T, out_dir: &Path, name: &str) -> Result<PathBuf, KiraError> {
        fs::create_dir_all(out_dir)
            .map_err(|err| KiraError::Filesystem(format!("create {}: {err}", out_dir.display())))?;
        let path = out_dir.join(format!("{name}.json"));
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        fs::write(&path, json)
            .map_err(|err| KiraError::Filesystem(format!("write {}: {err}", path.display())))?;
        Ok(path)
    }
}

// Long tables carry an unnamed 0-based index column.

impl CsvTable for AnnotationTable {
    fn header(&self) -> Vec<String> {
        columns(&["", "sample_id", "query", "KEGG_Module"])
    }

    fn write_records<W: Write>(&self, out: &mut csv::Writer<W>) -> csv::Result<()> {
        for (idx, r) in self.records().iter().enumerate() {
            out.write_record([
                idx.to_string().as_str(),
                r.sample_id.as_str(),
                r.query.as_str(),
                r.kegg_module.as_str(),
            ])?;
        }
        Ok(())
    }
}

impl CsvTable for [ModuleCount] {
    fn header(&self) -> Vec<String> {
        columns(&["", "sample_id", "KEGG_Module", "n_proteins"])
    }

    fn write_records<W: Write>(&self, out: &mut csv::Writer<W>) -> csv::Result<()> {
        for (idx, c) in self.iter().enumerate() {
            out.write_record([
                idx.to_string().as_str(),
                c.sample_id.as_str(),
                c.kegg_module.as_str(),
                c.n_proteins.to_string().as_str(),
            ])?;
        }
        Ok(())
    }
}

impl CsvTable for ReferenceTable {
    fn header(&self) -> Vec<String> {
        columns(&["", "KEGG_Module", "Module_name", "Module_description"])
    }

    fn write_records<W: Write>(&self, out: &mut csv::Writer<W>) -> csv::Result<()> {
        for (idx, m) in self.entries().iter().enumerate() {
            out.write_record([
                idx.to_string().as_str(),
                m.kegg_module.as_str(),
                m.module_name.as_str(),
                m.module_description.as_str(),
            ])?;
        }
        Ok(())
    }
}

impl CsvTable for [SampleGroup] {
    fn header(&self) -> Vec<String> {
        columns(&["sample_id", "group"])
    }

    fn write_records<W: Write>(&self, out: &mut csv::Writer<W>) -> csv::Result<()> {
        for row in self {
            out.write_record([row.sample_id.as_str(), row.group.as_str()])?;
        }
        Ok(())
    }
}

impl CsvTable for CountMatrix {
    fn header(&self) -> Vec<String> {
        std::iter::once("sample_id".to_string())
            .chain(self.module_ids().iter().cloned())
            .collect()
    }

    fn write_records<W: Write>(&self, out: &mut csv::Writer<W>) -> csv::Result<()> {
        for (sample_id, row) in self.sample_ids().iter().zip(self.rows()) {
            let record = std::iter::once(sample_id.to_string())
                .chain(row.iter().map(|value| value.to_string()));
            out.write_record(record)?;
        }
        Ok(())
    }
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}
