use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Reduced listing representation returned by list endpoints.
#[derive(Debug, Serialize)]
pub struct ListingPreviewDto {
    pub id: i32,
    pub title: String,
    pub price: i64,
    pub owner_name: String,
    pub image_base64: Option<String>,
    pub liked_by_users: Vec<i32>,
}

/// Full listing representation returned by the single-listing endpoint.
#[derive(Debug, Serialize)]
pub struct ListingDetailDto {
    pub id: i32,
    pub title: String,
    pub price: i64,
    pub created_at: String,

    pub rooms: i32,
    pub total_area: f64,
    pub kitchen_area: f64,
    pub floor: i32,
    pub total_floors: i32,

    pub deposit: i64,
    pub commission_percent: f64,
    pub utilities_separate: bool,

    pub allowed_children: bool,
    pub allowed_pets: bool,
    pub allowed_smoking: bool,

    pub address_city: String,
    pub address_street: String,
    pub address_house: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub description: String,

    pub user_id: Option<i32>,
    pub owner_name: String,
    pub owner_email: String,
    pub owner_phone: String,

    pub image_base64: Option<String>,
    pub liked_by_users: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: String,
}

/// Login response: profile fields plus the inline photo.
#[derive(Debug, Serialize)]
pub struct ProfileDto {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: String,
    pub photo_base64: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PhotoUploadResponse {
    pub photo_id: i32,
}
