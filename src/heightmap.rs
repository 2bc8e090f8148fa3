use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use bevy::{log::info, prelude::Vec3};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::Array2;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeightFieldError {
    #[error("cannot open height field {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("failed to read height field: {0}")]
    Io(#[from] io::Error),
    #[error("invalid grid dimensions {cols}x{rows}")]
    InvalidDimensions { cols: i64, rows: i64 },
    #[error("expected {expected} heights, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Elevation grid in the binary heightmap layout:
/// `i32 cols | i32 rows | f64 x_low_left | f64 y_low_left | f64 cell_size | i32 no_data | f32[rows * cols]`,
/// all little-endian.
///
/// Samples are indexed `[[col, row]]`, so walking the array in logical order
/// visits them in file order and the flat index of `(row, col)` is
/// `col * rows + row`.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    heights: Array2<f32>,
    x_low_left: f64,
    y_low_left: f64,
    cell_size: f64,
    no_data: i32,
}

impl HeightField {
    /// Builds a field from heights given in file order.
    ///
    /// Each dimension must fit the `i32` header fields and the point count
    /// must fit a `u32` mesh index.
    pub fn from_heights(cols: usize, rows: usize, heights: Vec<f32>) -> Result<Self, HeightFieldError> {
        let invalid = || HeightFieldError::InvalidDimensions {
            cols: i64::try_from(cols).unwrap_or(i64::MAX),
            rows: i64::try_from(rows).unwrap_or(i64::MAX),
        };

        if i32::try_from(cols).is_err() || i32::try_from(rows).is_err() {
            return Err(invalid());
        }
        let expected = cols
            .checked_mul(rows)
            .filter(|&n| u32::try_from(n).is_ok())
            .ok_or_else(invalid)?;
        if heights.len() != expected {
            return Err(HeightFieldError::LengthMismatch {
                expected,
                actual: heights.len(),
            });
        }

        let heights = Array2::from_shape_vec((cols, rows), heights).map_err(|_| invalid())?;

        Ok(Self {
            heights,
            x_low_left: 0.,
            y_low_left: 0.,
            cell_size: 1.,
            no_data: -9999,
        })
    }

    pub fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_origin(mut self, x_low_left: f64, y_low_left: f64) -> Self {
        self.x_low_left = x_low_left;
        self.y_low_left = y_low_left;
        self
    }

    pub fn with_no_data(mut self, no_data: i32) -> Self {
        self.no_data = no_data;
        self
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, HeightFieldError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| HeightFieldError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let field = Self::read(BufReader::new(file))?;
        info!(
            "Imported height field {}: {}x{} samples, cell size {}",
            path.display(),
            field.cols(),
            field.rows(),
            field.cell_size
        );

        Ok(field)
    }

    pub fn read(mut reader: impl Read) -> Result<Self, HeightFieldError> {
        let cols = reader.read_i32::<LittleEndian>()?;
        let rows = reader.read_i32::<LittleEndian>()?;
        let x_low_left = reader.read_f64::<LittleEndian>()?;
        let y_low_left = reader.read_f64::<LittleEndian>()?;
        let cell_size = reader.read_f64::<LittleEndian>()?;
        let no_data = reader.read_i32::<LittleEndian>()?;

        let invalid = HeightFieldError::InvalidDimensions {
            cols: cols as i64,
            rows: rows as i64,
        };
        if cols < 0 || rows < 0 {
            return Err(invalid);
        }
        let number_of_points = (cols as usize)
            .checked_mul(rows as usize)
            .filter(|&n| u32::try_from(n).is_ok())
            .ok_or(invalid)?;

        // Buffer grows with the payload, never with the header's claim.
        let expected_bytes = number_of_points as u64 * 4;
        let mut bytes = Vec::new();
        reader.take(expected_bytes).read_to_end(&mut bytes)?;
        if (bytes.len() as u64) < expected_bytes {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {expected_bytes} bytes of heights, got {}", bytes.len()),
            )
            .into());
        }

        let mut heights = vec![0.; number_of_points];
        LittleEndian::read_f32_into(&bytes, &mut heights);

        Ok(Self::from_heights(cols as usize, rows as usize, heights)?
            .with_origin(x_low_left, y_low_left)
            .with_cell_size(cell_size)
            .with_no_data(no_data))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), HeightFieldError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| HeightFieldError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut writer = BufWriter::new(file);
        self.write(&mut writer)?;
        writer.flush()?;

        Ok(())
    }

    pub fn write(&self, mut writer: impl Write) -> Result<(), HeightFieldError> {
        let (cols, rows) = match (i32::try_from(self.cols()), i32::try_from(self.rows())) {
            (Ok(cols), Ok(rows)) => (cols, rows),
            _ => {
                return Err(HeightFieldError::InvalidDimensions {
                    cols: self.cols() as i64,
                    rows: self.rows() as i64,
                })
            }
        };

        writer.write_i32::<LittleEndian>(cols)?;
        writer.write_i32::<LittleEndian>(rows)?;
        writer.write_f64::<LittleEndian>(self.x_low_left)?;
        writer.write_f64::<LittleEndian>(self.y_low_left)?;
        writer.write_f64::<LittleEndian>(self.cell_size)?;
        writer.write_i32::<LittleEndian>(self.no_data)?;

        for height in self.heights.iter() {
            writer.write_f32::<LittleEndian>(*height)?;
        }

        Ok(())
    }

    pub fn cols(&self) -> usize {
        self.heights.dim().0
    }

    pub fn rows(&self) -> usize {
        self.heights.dim().1
    }

    /// `(cols, rows)`
    pub fn dim(&self) -> (usize, usize) {
        self.heights.dim()
    }

    pub fn number_of_points(&self) -> usize {
        self.heights.len()
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.x_low_left, self.y_low_left)
    }

    /// Sentinel carried from the file. Meshing never looks at it.
    pub fn no_data(&self) -> i32 {
        self.no_data
    }

    pub fn rc2index(&self, row: usize, col: usize) -> usize {
        col * self.rows() + row
    }

    pub fn height_at(&self, row: usize, col: usize) -> f32 {
        self.heights[[col, row]]
    }

    pub fn height_at_index(&self, i: usize) -> f32 {
        let rows = self.rows();
        self.heights[[i / rows, i % rows]]
    }

    /// Heights in file order.
    pub fn heights(&self) -> impl Iterator<Item = f32> + '_ {
        self.heights.iter().copied()
    }

    pub fn vertex_at(&self, i: usize) -> Vec3 {
        let rows = self.rows();
        let cell_size = self.cell_size as f32;
        Vec3 {
            x: (i % rows) as f32 * cell_size,
            y: self.height_at_index(i),
            z: -((i / rows) as f32) * cell_size,
        }
    }

    pub(crate) fn heights_mut(&mut self) -> &mut Array2<f32> {
        &mut self.heights
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn encode(cols: i32, rows: i32, cell_size: f64, heights: &[f32]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(cols.to_le_bytes());
        bytes.extend(rows.to_le_bytes());
        bytes.extend(100.5f64.to_le_bytes());
        bytes.extend((-20.25f64).to_le_bytes());
        bytes.extend(cell_size.to_le_bytes());
        bytes.extend((-9999i32).to_le_bytes());
        for h in heights {
            bytes.extend(h.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn reads_header_and_heights_in_file_order() {
        let heights = [1., 2., 3., 4., 5., 6.];
        let field = HeightField::read(Cursor::new(encode(2, 3, 10., &heights))).unwrap();

        assert_eq!(field.cols(), 2);
        assert_eq!(field.rows(), 3);
        assert_eq!(field.origin(), (100.5, -20.25));
        assert_eq!(field.cell_size(), 10.);
        assert_eq!(field.no_data(), -9999);
        assert_eq!(field.number_of_points(), field.rows() * field.cols());
        assert_eq!(field.heights().collect::<Vec<_>>(), heights);

        // col * rows + row
        assert_eq!(field.rc2index(2, 1), 5);
        assert_eq!(field.height_at(0, 1), 4.);
        assert_eq!(field.height_at_index(2), 3.);
    }

    #[test]
    fn vertex_positions_follow_index_layout() {
        let field = HeightField::read(Cursor::new(encode(2, 3, 10., &[1., 2., 3., 4., 5., 6.]))).unwrap();

        assert_eq!(field.vertex_at(0), Vec3::new(0., 1., 0.));
        assert_eq!(field.vertex_at(2), Vec3::new(20., 3., 0.));
        assert_eq!(field.vertex_at(4), Vec3::new(10., 5., -10.));
    }

    #[test]
    fn truncated_heights_are_an_error() {
        let mut bytes = encode(2, 2, 1., &[1., 2., 3., 4.]);
        bytes.truncate(bytes.len() - 2);

        assert!(matches!(
            HeightField::read(Cursor::new(bytes)),
            Err(HeightFieldError::Io(_))
        ));
    }

    #[test]
    fn negative_dimensions_are_rejected() {
        assert!(matches!(
            HeightField::read(Cursor::new(encode(-1, 2, 1., &[]))),
            Err(HeightFieldError::InvalidDimensions { cols: -1, rows: 2 })
        ));
    }

    #[test]
    fn oversized_header_without_payload_is_an_error() {
        let bytes = encode(i32::MAX, i32::MAX, 1., &[]);
        assert!(matches!(
            HeightField::read(Cursor::new(bytes)),
            Err(HeightFieldError::InvalidDimensions { .. })
        ));

        // Fits a mesh index but the payload is missing.
        let bytes = encode(50_000, 50_000, 1., &[1., 2.]);
        match HeightField::read(Cursor::new(bytes)) {
            Err(HeightFieldError::Io(err)) => assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn dimensions_must_fit_header_and_indices() {
        assert!(matches!(
            HeightField::from_heights(i32::MAX as usize + 1, 0, Vec::new()),
            Err(HeightFieldError::InvalidDimensions { rows: 0, .. })
        ));
        assert!(matches!(
            HeightField::from_heights(1 << 16, (1 << 16) + 1, Vec::new()),
            Err(HeightFieldError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.bin");

        match HeightField::load(&path) {
            Err(HeightFieldError::Open { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn saved_field_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terrain.bin");

        let field = HeightField::from_heights(3, 2, vec![0., -1., 2.5, 3., 4., 5.])
            .unwrap()
            .with_cell_size(2.)
            .with_origin(1., 2.)
            .with_no_data(-1);
        field.save(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 4 + 4 + 8 * 3 + 4 + 4 * 6);
        assert_eq!(HeightField::load(&path).unwrap(), field);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        assert!(matches!(
            HeightField::from_heights(2, 2, vec![0.; 3]),
            Err(HeightFieldError::LengthMismatch { expected: 4, actual: 3 })
        ));
    }
}
