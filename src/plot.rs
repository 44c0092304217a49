use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::KiraError;
use crate::matrix::CountMatrix;

pub type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub trait Figure {
    fn size_inches(&self) -> (f64, f64) {
        (6.4, 4.8)
    }

    fn render(&self, canvas: &Canvas<'_>) -> Result<(), KiraError>;
}

const MARGIN: i32 = 10;
const LOW: (u8, u8, u8) = (247, 251, 255);
const HIGH: (u8, u8, u8) = (8, 48, 107);

pub struct ModuleHeatmap<'a> {
    matrix: &'a CountMatrix,
}

impl<'a> ModuleHeatmap<'a> {
    pub fn new(matrix: &'a CountMatrix) -> Self {
        Self { matrix }
    }
}

impl Figure for ModuleHeatmap<'_> {
    fn render(&self, canvas: &Canvas<'_>) -> Result<(), KiraError> {
        if self.matrix.is_empty() {
            return Err(KiraError::EmptyMatrix);
        }
        let (width, height) = canvas.dim_in_pixel();
        let plot_w = (width as i32 - 2 * MARGIN).max(1) as f64;
        let plot_h = (height as i32 - 2 * MARGIN).max(1) as f64;
        let cell_w = plot_w / self.matrix.n_modules() as f64;
        let cell_h = plot_h / self.matrix.n_samples() as f64;
        let scale = (self.matrix.max_count() as f64).ln_1p();

        for (row_idx, row) in self.matrix.rows().iter().enumerate() {
            let y0 = MARGIN + (row_idx as f64 * cell_h) as i32;
            let y1 = MARGIN + ((row_idx + 1) as f64 * cell_h) as i32;
            for (col_idx, value) in row.iter().enumerate() {
                let x0 = MARGIN + (col_idx as f64 * cell_w) as i32;
                let x1 = MARGIN + ((col_idx + 1) as f64 * cell_w) as i32;
                let intensity = if scale > 0.0 {
                    (*value as f64).ln_1p() / scale
                } else {
                    0.0
                };
                canvas
                    .draw(&Rectangle::new([(x0, y0), (x1, y1)], ramp(intensity).filled()))
                    .map_err(|err| KiraError::Plot(err.to_string()))?;
            }
        }
        Ok(())
    }
}

fn ramp(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let mix = |lo: u8, hi: u8| (lo as f64 + (hi as f64 - lo as f64) * t).round() as u8;
    RGBColor(mix(LOW.0, HIGH.0), mix(LOW.1, HIGH.1), mix(LOW.2, HIGH.2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_endpoints() {
        assert_eq!(ramp(0.0).rgb(), LOW);
        assert_eq!(ramp(1.0).rgb(), HIGH);
        assert_eq!(ramp(7.0).rgb(), HIGH);
    }
}
