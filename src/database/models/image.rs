use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// The record an image is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Imageable {
    Spot(i32),
    Review(i32),
}

impl Imageable {
    pub fn kind(&self) -> &'static str {
        match self {
            Imageable::Spot(_) => "Spot",
            Imageable::Review(_) => "Review",
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            Imageable::Spot(id) | Imageable::Review(id) => *id,
        }
    }

    pub fn from_parts(kind: &str, id: i32) -> Option<Self> {
        match kind {
            "Spot" => Some(Imageable::Spot(id)),
            "Review" => Some(Imageable::Review(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    pub id: i32,
    pub owner: Imageable,
    pub url: String,
    pub preview_image: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub owner: Imageable,
    pub url: String,
    pub preview_image: bool,
}

/// Raw `images` row as stored in PostgreSQL
#[derive(Debug, FromRow)]
pub struct ImageRow {
    pub id: i32,
    pub imageable_type: String,
    pub imageable_id: i32,
    pub url: String,
    pub preview_image: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ImageRow> for Image {
    type Error = String;

    fn try_from(row: ImageRow) -> Result<Self, Self::Error> {
        let owner = Imageable::from_parts(&row.imageable_type, row.imageable_id)
            .ok_or_else(|| format!("unknown imageable_type '{}' on image {}", row.imageable_type, row.id))?;
        Ok(Image {
            id: row.id,
            owner,
            url: row.url,
            preview_image: row.preview_image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imageable_round_trips_through_columns() {
        let owner = Imageable::Review(12);
        assert_eq!(Imageable::from_parts(owner.kind(), owner.id()), Some(owner));
        assert_eq!(Imageable::from_parts("Booking", 1), None);
    }
}
