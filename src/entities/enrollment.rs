use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "enrollment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub delegation_id: i32,

    // Personal and demographic
    pub social_name: Option<String>,
    pub birth_date: Date,
    pub gender_identity: String,
    pub sexual_orientation: Option<String>,
    pub race_color: String,
    pub is_pcd: bool,
    pub pcd_description: Option<String>,
    pub rg: String,
    pub rg_issuer: String,

    // Contact
    pub email: String,
    pub phone: String,
    pub whatsapp: Option<String>,

    // Address
    pub cep: String,
    pub street: String,
    pub address_number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub address_state: String,

    // Cultural activity
    pub cultural_organization: String,
    pub cultural_segment: String,
    pub role_in_organization: Option<String>,
    pub years_active: i32,

    // Logistics
    #[sea_orm(column_type = "Text", nullable)]
    pub accessibility_needs: Option<String>,
    pub dietary_restriction: Option<String>,
    pub shirt_size: String,
    pub needs_lodging: bool,
    pub needs_transport: bool,
    pub departure_city: Option<String>,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,

    pub consent_data_use: bool,
    pub consent_image_use: bool,
    pub consent_code_of_conduct: bool,

    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::delegation::Entity",
        from = "Column::DelegationId",
        to = "super::delegation::Column::Id",
        on_delete = "Cascade"
    )]
    Delegation,
}

impl Related<super::delegation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Delegation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
