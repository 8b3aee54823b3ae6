//! Binary raster masks.

use serde::{Deserialize, Serialize};

use crate::error::AnnotError;

/// Row-major grid of 0/1 cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMask")]
pub struct Mask {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

#[derive(Deserialize)]
struct RawMask {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl TryFrom<RawMask> for Mask {
    type Error = AnnotError;

    fn try_from(raw: RawMask) -> Result<Self, Self::Error> {
        Mask::new(raw.width, raw.height, raw.data)
    }
}

impl Mask {
    /// Builds a mask, checking that `data` holds exactly `width * height` cells.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, AnnotError> {
        if width.checked_mul(height) != Some(data.len()) {
            return Err(AnnotError::MaskDimension {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }

    /// Grows every set cell into its eight neighbours.
    ///
    /// Neighbours are taken at flat offsets, so a cell on the right edge also
    /// touches the left edge of the next row. Use [`Mask::add_border`] first
    /// when that matters.
    pub fn dilate(&self) -> Mask {
        let w = self.width as isize;
        let len = self.data.len() as isize;
        let offsets = [-w - 1, -w, -w + 1, -1, 1, w - 1, w, w + 1];

        let data = (0..len)
            .map(|ind| {
                if self.data[ind as usize] != 0 {
                    return 1;
                }
                let hit = offsets
                    .iter()
                    .map(|off| ind + off)
                    .filter(|n| (0..len).contains(n))
                    .any(|n| self.data[n as usize] != 0);
                u8::from(hit)
            })
            .collect();

        Mask {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Copy of the mask surrounded by a one-cell zero border.
    pub fn add_border(&self) -> Mask {
        let width = self.width + 2;
        let height = self.height + 2;
        let mut data = vec![0; width * height];
        for (y, row) in self.data.chunks(self.width.max(1)).enumerate() {
            let start = (y + 1) * width + 1;
            data[start..start + row.len()].copy_from_slice(row);
        }
        Mask { width, height, data }
    }
}
