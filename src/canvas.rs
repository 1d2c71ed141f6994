use std::io::{ BufWriter, Write };
use std::fs::File;
use std::path::Path;

use crate::Result;
use crate::color::Color;

/// A canvas for drawing pixels.
///
/// The renderer writes one color per pixel into a canvas; once rendering
/// finishes, the canvas can be saved as an image file. Only plain (P3) PPM
/// images are supported.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Canvas {
    /// The width of the canvas, in pixels.
    pub width: usize,

    /// The height of the canvas, in pixels.
    pub height: usize,

    /// The pixels of the canvas, stored row by row.
    pixels: Vec<Color>,
}

impl Canvas {
    /// Creates a black canvas with specified width and height.
    pub fn new(width: usize, height: usize) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![Color::black(); width * height]
        }
    }

    /// All pixels, in row-major order.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Saves a canvas to a PPM file.
    ///
    /// See `write_ppm`.
    pub fn save_ppm(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_ppm(&mut out)?;
        out.flush()?;

        Ok(())
    }

    /// Encodes the canvas as a plain PPM image.
    ///
    /// Lines are kept within 70 columns. If a channel value would cross the
    /// 70 column mark, it is moved to the next line over.
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "P3")?;
        writeln!(out, "{} {}", self.width, self.height)?;
        writeln!(out, "255")?; // Maximum color value

        let mut col = 0;
        for pixel in self.pixels.iter() {
            for channel in [pixel.r, pixel.g, pixel.b].iter() {
                let s = channel.to_string();

                if col == 0 {
                    write!(out, "{}", s)?;
                    col = s.len();
                } else if col + 1 + s.len() > 70 {
                    write!(out, "\n{}", s)?;
                    col = s.len();
                } else {
                    write!(out, " {}", s)?;
                    col += 1 + s.len();
                }
            }
        }

        // Terminate the PPM file with a newline
        writeln!(out)?;

        Ok(())
    }

    /// Writes a color to a location on the `Canvas`.
    ///
    /// Out-of-bounds pixels are ignored. Pixels are specified in row-column
    /// order, where `y` is the row of the pixel, and `x` is the column. Rows
    /// and columns are zero-indexed.
    ///
    /// # Examples
    ///
    /// Writing a pixel to the fourth column, second row on an 8-by-8 canvas:
    ///
    /// ```
    /// # use refract::color::Color;
    /// # use refract::canvas::Canvas;
    /// let purple = Color::rgb(255, 0, 255);
    /// let mut canvas = Canvas::new(8, 8);
    /// canvas.write_pixel(4, 2, purple);
    /// assert_eq!(canvas.read_pixel(4, 2), Some(purple));
    /// ```
    pub fn write_pixel(&mut self, x: usize, y: usize, pixel: Color) {
        if x >= self.width || y >= self.height {
            return;
        }

        self.pixels[(y * self.width) + x] = pixel;
    }

    /// Reads a color from a location on the `Canvas`.
    ///
    /// Returns `None` if the location is out-of-bounds.
    pub fn read_pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None
        }

        Some(self.pixels[(y * self.width) + x])
    }
}

/* Tests */

#[test]
fn new_canvas_is_black() {
    let c = Canvas::new(10, 20);

    assert_eq!(c.pixels().len(), 200);
    assert!(c.pixels().iter().all(|p| *p == Color::black()));
}

#[test]
fn out_of_bounds_pixels_are_ignored() {
    let mut c = Canvas::new(4, 3);
    c.write_pixel(4, 0, Color::white());
    c.write_pixel(0, 3, Color::white());

    assert_eq!(c, Canvas::new(4, 3));
    assert_eq!(c.read_pixel(4, 0), None);
    assert_eq!(c.read_pixel(3, 2), Some(Color::black()));
}

#[test]
fn ppm_header_and_body() {
    let mut c = Canvas::new(2, 2);
    c.write_pixel(1, 0, Color::rgb(255, 0, 128));
    c.write_pixel(0, 1, Color::rgb(7, 8, 9));

    let mut buf = Vec::new();
    c.write_ppm(&mut buf).unwrap();

    let ppm = String::from_utf8(buf).unwrap();
    assert_eq!(ppm, "P3\n2 2\n255\n0 0 0 255 0 128 7 8 9 0 0 0\n");
}

#[test]
fn ppm_lines_stay_within_70_columns() {
    let mut c = Canvas::new(10, 2);
    for y in 0..2 {
        for x in 0..10 {
            c.write_pixel(x, y, Color::rgb(255, 204, 153));
        }
    }

    let mut buf = Vec::new();
    c.write_ppm(&mut buf).unwrap();
    let ppm = String::from_utf8(buf).unwrap();

    let body: Vec<&str> = ppm.lines().skip(3).collect();
    assert!(body.iter().all(|line| line.len() <= 70));
    assert_eq!(body[0].len(), 67);

    // No channel is split across lines
    let values = body.iter().flat_map(|line| line.split(' ')).count();
    assert_eq!(values, 60);
    assert!(ppm.ends_with('\n'));
}
