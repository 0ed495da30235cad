//! Accounts, properties and rooms: host onboarding and the public page.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;
use uuid::Uuid;

use staybook_shared::{slugify, Address, Capacity, PricingMode, RoomPricing, UserRole};
use staybook_store::{Database, Property, Room, User};

use crate::actor::{Actor, CurrentActor};
use crate::api::AppState;
use crate::error::ServerError;

/// Upper bound on numeric suffixes tried for a derived slug.
const MAX_SLUG_SUFFIX: u32 = 1000;

fn non_empty(value: &str, field: &str) -> Result<String, ServerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServerError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Load a property the actor is allowed to manage.
pub(crate) fn managed_property(
    db: &Database,
    actor: &Actor,
    id: Uuid,
) -> Result<Property, ServerError> {
    let property = db
        .get_property(id)
        .map_err(ServerError::from_store("property"))?;
    actor.ensure_can_manage(&property)?;
    Ok(property)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
}

pub async fn create_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ServerError> {
    let Json(req) = payload?;

    let role = req.role.unwrap_or(UserRole::Guest);
    let privileged = matches!(role, UserRole::Admin | UserRole::Agent);
    if privileged && !actor.as_ref().is_some_and(Actor::is_admin) {
        return Err(ServerError::Forbidden(format!(
            "only an admin may create {role} accounts"
        )));
    }

    let user = User {
        id: Uuid::new_v4(),
        name: non_empty(&req.name, "name")?,
        email: req
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty()),
        phone: req.phone.filter(|p| !p.trim().is_empty()),
        role,
        created_at: Utc::now(),
    };

    let user = state
        .db
        .run(move |db| {
            db.create_user(&user)?;
            Ok(user)
        })
        .await?;

    info!(user_id = %user.id, role = %user.role, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// A property plus the number of rooms actually attached to it.
#[derive(Debug, Serialize)]
pub struct PropertyView {
    #[serde(flatten)]
    pub property: Property,
    pub rooms_count: u32,
}

impl PropertyView {
    fn load(db: &Database, property: Property) -> Result<Self, ServerError> {
        let rooms_count = db.count_rooms(property.id)?;
        Ok(Self {
            property,
            rooms_count,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePropertyRequest {
    pub name: String,
    #[serde(default)]
    pub address: Address,
    pub pricing_mode: PricingMode,
    #[serde(default)]
    pub pricing_value: Option<u64>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub total_rooms: u32,
}

/// Pick a free slug. An explicit slug must be free; a derived one gets the
/// first free numeric suffix.
fn allocate_slug(db: &Database, explicit: Option<&str>, name: &str) -> Result<String, ServerError> {
    if let Some(raw) = explicit {
        let slug = slugify(raw);
        if slug.is_empty() {
            return Err(ServerError::Validation("slug must contain letters or digits".into()));
        }
        if db.slug_exists(&slug)? {
            return Err(ServerError::Conflict(format!("slug {slug} is taken")));
        }
        return Ok(slug);
    }

    let base = slugify(name);
    if base.is_empty() {
        return Err(ServerError::Validation(
            "property name must contain letters or digits".into(),
        ));
    }
    if !db.slug_exists(&base)? {
        return Ok(base);
    }
    for n in 2..=MAX_SLUG_SUFFIX {
        let candidate = format!("{base}-{n}");
        if !db.slug_exists(&candidate)? {
            return Ok(candidate);
        }
    }
    Err(ServerError::Conflict(format!("no free slug for {base}")))
}

pub async fn create_property(
    State(state): State<AppState>,
    actor: CurrentActor,
    payload: Result<Json<CreatePropertyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PropertyView>), ServerError> {
    let actor = actor.require()?;
    let Json(req) = payload?;

    if !actor.role.can_host() {
        return Err(ServerError::Forbidden("only hosts may list properties".into()));
    }
    let name = non_empty(&req.name, "property name")?;

    let view = state
        .db
        .run(move |db| {
            let slug = allocate_slug(db, req.slug.as_deref(), &name)?;
            let now = Utc::now();
            let property = Property {
                id: Uuid::new_v4(),
                host_id: actor.id,
                name,
                address: req.address,
                pricing_mode: req.pricing_mode,
                pricing_value: req.pricing_value,
                slug,
                total_rooms: req.total_rooms,
                is_active: true,
                is_verified: false,
                created_at: now,
                updated_at: now,
            };
            db.create_property(&property)?;
            PropertyView::load(db, property)
        })
        .await?;

    info!(
        property_id = %view.property.id,
        slug = %view.property.slug,
        host = %view.property.host_id,
        "Property created"
    );
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_property(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<PropertyView>, ServerError> {
    let Path(id) = id?;
    let view = state
        .db
        .run(move |db| {
            let property = db
                .get_property(id)
                .map_err(ServerError::from_store("property"))?;
            PropertyView::load(db, property)
        })
        .await?;
    Ok(Json(view))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePropertyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub pricing_value: Option<u64>,
    #[serde(default)]
    pub total_rooms: Option<u32>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_verified: Option<bool>,
}

pub async fn update_property(
    State(state): State<AppState>,
    actor: CurrentActor,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdatePropertyRequest>, JsonRejection>,
) -> Result<Json<PropertyView>, ServerError> {
    let Path(id) = id?;
    let actor = actor.require()?;
    let Json(req) = payload?;

    if req.is_verified.is_some() && !actor.is_admin() {
        return Err(ServerError::Forbidden(
            "only an admin may change verification".into(),
        ));
    }

    let view = state
        .db
        .run(move |db| {
            let mut property = managed_property(db, &actor, id)?;
            if let Some(name) = req.name {
                property.name = non_empty(&name, "property name")?;
            }
            if let Some(address) = req.address {
                property.address = address;
            }
            if let Some(value) = req.pricing_value {
                property.pricing_value = Some(value);
            }
            if let Some(total) = req.total_rooms {
                property.total_rooms = total;
            }
            if let Some(active) = req.is_active {
                property.is_active = active;
            }
            if let Some(verified) = req.is_verified {
                property.is_verified = verified;
            }
            property.updated_at = Utc::now();
            db.update_property(&property)?;
            PropertyView::load(db, property)
        })
        .await?;

    info!(property_id = %view.property.id, active = view.property.is_active, "Property updated");
    Ok(Json(view))
}

pub async fn host_properties(
    State(state): State<AppState>,
    actor: CurrentActor,
) -> Result<Json<Vec<PropertyView>>, ServerError> {
    let actor = actor.require()?;
    let views = state
        .db
        .run(move |db| {
            db.list_properties_for_host(actor.id)?
                .into_iter()
                .map(|p| PropertyView::load(db, p))
                .collect::<Result<Vec<_>, _>>()
        })
        .await?;
    Ok(Json(views))
}

/// Read model behind the public booking page.
#[derive(Debug, Serialize)]
pub struct PublicPage {
    pub property: Property,
    pub rooms: Vec<Room>,
}

pub async fn public_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicPage>, ServerError> {
    let page = state
        .db
        .run(move |db| {
            let property = db
                .get_property_by_slug(&slug)
                .map_err(ServerError::from_store("property"))?;
            if !property.is_active {
                return Err(ServerError::not_found("property"));
            }
            let rooms = db.list_rooms_for_property(property.id, true)?;
            Ok(PublicPage { property, rooms })
        })
        .await?;
    Ok(Json(page))
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub category: String,
    pub room_number: String,
    #[serde(default)]
    pub capacity: Capacity,
    pub pricing: RoomPricing,
    #[serde(default)]
    pub advance_amount: Option<u64>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// A flat-rate room without a base occupancy covers its adult capacity.
fn normalize_pricing(pricing: RoomPricing, capacity: &Capacity) -> RoomPricing {
    match pricing {
        RoomPricing::PerRoom {
            room_rate,
            base_occupancy: 0,
            extra_person_charge,
        } => RoomPricing::PerRoom {
            room_rate,
            base_occupancy: capacity.adults,
            extra_person_charge,
        },
        other => other,
    }
}

pub async fn create_room(
    State(state): State<AppState>,
    actor: CurrentActor,
    property_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Room>), ServerError> {
    let Path(property_id) = property_id?;
    let actor = actor.require()?;
    let Json(req) = payload?;

    let category = non_empty(&req.category, "category")?;
    let room_number = non_empty(&req.room_number, "room number")?;

    let room = state
        .db
        .run(move |db| {
            let property = managed_property(db, &actor, property_id)?;
            req.pricing.ensure_matches(property.pricing_mode)?;

            let now = Utc::now();
            let room = Room {
                id: Uuid::new_v4(),
                property_id: property.id,
                category,
                room_number,
                pricing: normalize_pricing(req.pricing, &req.capacity),
                capacity: req.capacity,
                advance_amount: req.advance_amount,
                amenities: req.amenities,
                images: req.images,
                is_active: true,
                is_available: true,
                created_at: now,
                updated_at: now,
            };
            db.create_room(&room)?;
            Ok(room)
        })
        .await?;

    info!(
        room_id = %room.id,
        property_id = %room.property_id,
        category = %room.category,
        number = %room.room_number,
        "Room created"
    );
    Ok((StatusCode::CREATED, Json(room)))
}

/// Owners and admins see every room; everyone else only bookable ones.
pub async fn list_rooms(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    property_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<Room>>, ServerError> {
    let Path(property_id) = property_id?;
    let rooms = state
        .db
        .run(move |db| {
            let property = db
                .get_property(property_id)
                .map_err(ServerError::from_store("property"))?;
            let manager = actor.as_ref().is_some_and(|a| a.can_manage(&property));
            Ok(db.list_rooms_for_property(property.id, !manager)?)
        })
        .await?;
    Ok(Json(rooms))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRoomRequest {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub room_number: Option<String>,
    #[serde(default)]
    pub capacity: Option<Capacity>,
    #[serde(default)]
    pub pricing: Option<RoomPricing>,
    /// `Some(Some(amount))` = set, `Some(None)` = clear, `None` = no change.
    #[serde(default, deserialize_with = "present")]
    pub advance_amount: Option<Option<u64>>,
    #[serde(default)]
    pub amenities: Option<Vec<String>>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_available: Option<bool>,
}

/// Marks a field as present, so an explicit `null` is kept apart from an
/// absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub async fn update_room(
    State(state): State<AppState>,
    actor: CurrentActor,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateRoomRequest>, JsonRejection>,
) -> Result<Json<Room>, ServerError> {
    let Path(id) = id?;
    let actor = actor.require()?;
    let Json(req) = payload?;

    let room = state
        .db
        .run(move |db| {
            let mut room = db.get_room(id).map_err(ServerError::from_store("room"))?;
            let property = managed_property(db, &actor, room.property_id)?;

            if let Some(category) = req.category {
                room.category = non_empty(&category, "category")?;
            }
            if let Some(number) = req.room_number {
                room.room_number = non_empty(&number, "room number")?;
            }
            if let Some(capacity) = req.capacity {
                room.capacity = capacity;
            }
            if let Some(pricing) = req.pricing {
                pricing.ensure_matches(property.pricing_mode)?;
                room.pricing = normalize_pricing(pricing, &room.capacity);
            }
            if let Some(advance) = req.advance_amount {
                room.advance_amount = advance;
            }
            if let Some(amenities) = req.amenities {
                room.amenities = amenities;
            }
            if let Some(images) = req.images {
                room.images = images;
            }
            if let Some(active) = req.is_active {
                room.is_active = active;
            }
            if let Some(available) = req.is_available {
                room.is_available = available;
            }
            room.updated_at = Utc::now();
            db.update_room(&room)?;
            Ok(room)
        })
        .await?;

    info!(room_id = %room.id, bookable = room.is_bookable(), "Room updated");
    Ok(Json(room))
}
