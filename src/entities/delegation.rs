use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum DelegateType {
    #[sea_orm(string_value = "eleito")]
    Eleito,
    /// Ex-officio seat, not counted against the elected cap.
    #[sea_orm(string_value = "nato")]
    Nato,
    #[sea_orm(string_value = "suplente")]
    Suplente,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum Quota {
    #[sea_orm(string_value = "ampla_concorrencia")]
    AmplaConcorrencia,
    #[sea_orm(string_value = "mulheres")]
    Mulheres,
    #[sea_orm(string_value = "pessoas_negras")]
    PessoasNegras,
    #[sea_orm(string_value = "povos_indigenas")]
    PovosIndigenas,
    #[sea_orm(string_value = "povos_tradicionais")]
    PovosTradicionais,
    #[sea_orm(string_value = "pcd")]
    Pcd,
    #[sea_orm(string_value = "lgbtqiapn")]
    Lgbtqiapn,
    #[sea_orm(string_value = "juventude")]
    Juventude,
    #[sea_orm(string_value = "pessoa_idosa")]
    PessoaIdosa,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "delegation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub full_name: String,
    /// Digits only.
    pub cpf: String,
    pub mother_name: String,
    pub state: String,
    pub quota: Quota,
    pub delegate_type: DelegateType,
    pub completed: bool,
    /// For alternates, the elected delegate this entry stands in for.
    pub substitutes_id: Option<i32>,
    pub created_by: Option<i32>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::SubstitutesId",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    Substitutes,
    #[sea_orm(has_one = "super::enrollment::Entity")]
    Enrollment,
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
