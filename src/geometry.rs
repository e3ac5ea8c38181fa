//! 三维尺寸与坐标

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// 结构尺寸，三个分量均为正数，两层方块索引的总数不超过 `usize`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[i32; 3]", into = "[i32; 3]")]
pub struct Size {
    x: i32,
    y: i32,
    z: i32,
}

impl Size {
    pub fn new(x: i32, y: i32, z: i32) -> Result<Self, ValidationError> {
        for (field, value) in [("x", x), ("y", y), ("z", z)] {
            if value <= 0 {
                return Err(ValidationError::Size { field, value });
            }
        }
        let total = (x as usize)
            .checked_mul(y as usize)
            .and_then(|v| v.checked_mul(z as usize))
            .and_then(|v| v.checked_mul(2));
        if total.is_none() {
            return Err(ValidationError::SizeOverflow { x, y, z });
        }
        Ok(Self { x, y, z })
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    pub fn volume(&self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }

    /// 水平方向占地边长
    pub fn footprint(&self) -> i32 {
        self.x.max(self.z)
    }

    /// 行优先（x 最外层，z 最内层）的扁平下标
    pub fn index_of(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        let inside = (0..self.x).contains(&x) && (0..self.y).contains(&y) && (0..self.z).contains(&z);
        inside.then(|| (x as usize * self.y as usize + y as usize) * self.z as usize + z as usize)
    }

    /// 按扁平下标顺序遍历所有坐标
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> {
        let Size { x, y, z } = *self;
        (0..x).flat_map(move |cx| {
            (0..y).flat_map(move |cy| (0..z).map(move |cz| Coordinate::new(cx, cy, cz)))
        })
    }
}

impl TryFrom<[i32; 3]> for Size {
    type Error = ValidationError;

    fn try_from([x, y, z]: [i32; 3]) -> Result<Self, Self::Error> {
        Self::new(x, y, z)
    }
}

impl From<Size> for [i32; 3] {
    fn from(size: Size) -> Self {
        [size.x, size.y, size.z]
    }
}

/// 方块坐标，按 x、y、z 依次比较
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl From<[i32; 3]> for Coordinate {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Coordinate> for [i32; 3] {
    fn from(c: Coordinate) -> Self {
        [c.x, c.y, c.z]
    }
}

/// 把整数列表转换为三元组
pub(crate) fn triple(field: &str, values: &[i32]) -> Result<[i32; 3], ValidationError> {
    <[i32; 3]>::try_from(values).map_err(|_| ValidationError::VectorLength {
        field: field.to_string(),
        expected: 3,
        actual: values.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_is_product() {
        let size = Size::new(2, 3, 4).unwrap();
        assert_eq!(size.volume(), 24);
        assert_eq!(size.footprint(), 4);
    }

    #[test]
    fn rejects_non_positive() {
        assert!(Size::new(0, 1, 1).is_err());
        assert!(Size::new(1, -1, 1).is_err());
        assert!(Size::try_from([1, 1, 0]).is_err());
    }

    #[test]
    fn rejects_overflowing_volume() {
        assert_eq!(
            Size::new(i32::MAX, i32::MAX, i32::MAX),
            Err(ValidationError::SizeOverflow {
                x: i32::MAX,
                y: i32::MAX,
                z: i32::MAX
            })
        );
        assert_eq!(Size::new(64, 384, 64).unwrap().volume(), 64 * 384 * 64);
    }

    #[test]
    fn index_is_row_major() {
        let size = Size::new(2, 3, 4).unwrap();
        assert_eq!(size.index_of(0, 0, 1), Some(1));
        assert_eq!(size.index_of(0, 1, 0), Some(4));
        assert_eq!(size.index_of(1, 0, 0), Some(12));
        assert_eq!(size.index_of(1, 2, 3), Some(23));
        assert_eq!(size.index_of(2, 0, 0), None);

        let order: Vec<usize> = size
            .coordinates()
            .map(|c| size.index_of(c.x, c.y, c.z).unwrap())
            .collect();
        assert_eq!(order, (0..24).collect::<Vec<_>>());
    }

    #[test]
    fn coordinates_order_x_then_y_then_z() {
        let mut coords = vec![
            Coordinate::new(1, 0, 0),
            Coordinate::new(0, 5, 0),
            Coordinate::new(0, 0, 9),
            Coordinate::new(0, 5, -1),
        ];
        coords.sort();
        assert_eq!(
            coords,
            vec![
                Coordinate::new(0, 0, 9),
                Coordinate::new(0, 5, -1),
                Coordinate::new(0, 5, 0),
                Coordinate::new(1, 0, 0),
            ]
        );
    }

    #[test]
    fn triple_checks_length() {
        assert_eq!(triple("size", &[1, 2, 3]).unwrap(), [1, 2, 3]);
        assert!(triple("size", &[1, 2]).is_err());
    }
}
