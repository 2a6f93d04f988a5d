use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
pub enum AppUser {
    Table,
    Id,
    Email,
    PasswordHash,
    Name,
    Role,
    State,
}

#[derive(DeriveIden)]
pub enum Event {
    Table,
    Id,
    Kind,
    Title,
    StartDate,
    EndDate,
    Location,
    Theme,
    EstimatedAttendance,
    State,
    OwnerId,
}

#[derive(DeriveIden)]
pub enum Delegation {
    Table,
    Id,
    FullName,
    Cpf,
    MotherName,
    State,
    Quota,
    DelegateType,
    Completed,
    SubstitutesId,
    CreatedBy,
}

#[derive(DeriveIden)]
pub enum Enrollment {
    Table,
    Id,
    DelegationId,
    SocialName,
    BirthDate,
    GenderIdentity,
    SexualOrientation,
    RaceColor,
    IsPcd,
    PcdDescription,
    Rg,
    RgIssuer,
    Email,
    Phone,
    Whatsapp,
    Cep,
    Street,
    AddressNumber,
    Complement,
    Neighborhood,
    City,
    AddressState,
    CulturalOrganization,
    CulturalSegment,
    RoleInOrganization,
    YearsActive,
    AccessibilityNeeds,
    DietaryRestriction,
    ShirtSize,
    NeedsLodging,
    NeedsTransport,
    DepartureCity,
    EmergencyContactName,
    EmergencyContactPhone,
    ConsentDataUse,
    ConsentImageUse,
    ConsentCodeOfConduct,
}

#[derive(DeriveIden)]
pub enum StateReport {
    Table,
    Id,
    State,
    Title,
    Description,
    DocumentUrl,
    UploadedBy,
}
