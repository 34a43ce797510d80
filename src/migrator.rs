use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_partners_table::Migration),
            Box::new(m20240601_000002_create_service_points_table::Migration),
            Box::new(m20240601_000003_create_service_posts_table::Migration),
            Box::new(m20240601_000004_create_services_tables::Migration),
            Box::new(m20240601_000005_create_service_point_photos_table::Migration),
            Box::new(m20240601_000006_create_schedules_table::Migration),
            Box::new(m20240601_000007_create_bookings_table::Migration),
        ]
    }
}

mod m20240601_000001_create_partners_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_partners_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Partners::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Partners::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Partners::CompanyName).string().not_null())
                        .col(ColumnDef::new(Partners::ContactPerson).string().not_null())
                        .col(ColumnDef::new(Partners::Phone).string().not_null())
                        .col(ColumnDef::new(Partners::Email).string().not_null())
                        .col(ColumnDef::new(Partners::LegalAddress).string().null())
                        .col(ColumnDef::new(Partners::TaxNumber).string().null())
                        .col(ColumnDef::new(Partners::Website).string().null())
                        .col(ColumnDef::new(Partners::UserId).uuid().null())
                        .col(
                            ColumnDef::new(Partners::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Partners::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Partners::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_partners_company_name")
                        .table(Partners::Table)
                        .col(Partners::CompanyName)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Partners::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(crate) enum Partners {
        Table,
        Id,
        CompanyName,
        ContactPerson,
        Phone,
        Email,
        LegalAddress,
        TaxNumber,
        Website,
        UserId,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000002_create_service_points_table {

    use super::m20240601_000001_create_partners_table::Partners;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_service_points_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ServicePoints::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ServicePoints::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ServicePoints::PartnerId).uuid().not_null())
                        .col(ColumnDef::new(ServicePoints::Name).string().not_null())
                        .col(ColumnDef::new(ServicePoints::Description).text().null())
                        .col(ColumnDef::new(ServicePoints::Address).string().not_null())
                        .col(ColumnDef::new(ServicePoints::City).string().not_null())
                        .col(ColumnDef::new(ServicePoints::Latitude).double().null())
                        .col(ColumnDef::new(ServicePoints::Longitude).double().null())
                        .col(ColumnDef::new(ServicePoints::ContactPhone).string().null())
                        .col(
                            ColumnDef::new(ServicePoints::Status)
                                .string_len(16)
                                .not_null()
                                .default("active"),
                        )
                        .col(ColumnDef::new(ServicePoints::WorkingHours).json().not_null())
                        .col(ColumnDef::new(ServicePoints::PriceListUrl).string().null())
                        .col(
                            ColumnDef::new(ServicePoints::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServicePoints::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServicePoints::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_service_points_partner_id")
                                .from(ServicePoints::Table, ServicePoints::PartnerId)
                                .to(Partners::Table, Partners::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_service_points_partner_id")
                        .table(ServicePoints::Table)
                        .col(ServicePoints::PartnerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_service_points_city_status")
                        .table(ServicePoints::Table)
                        .col(ServicePoints::City)
                        .col(ServicePoints::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ServicePoints::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(crate) enum ServicePoints {
        Table,
        Id,
        PartnerId,
        Name,
        Description,
        Address,
        City,
        Latitude,
        Longitude,
        ContactPhone,
        Status,
        WorkingHours,
        PriceListUrl,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20240601_000003_create_service_posts_table {

    use super::m20240601_000002_create_service_points_table::ServicePoints;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_service_posts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ServicePosts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ServicePosts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServicePosts::ServicePointId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ServicePosts::Name).string().not_null())
                        .col(ColumnDef::new(ServicePosts::PostNumber).integer().not_null())
                        .col(
                            ColumnDef::new(ServicePosts::SlotDurationMinutes)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServicePosts::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ServicePosts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServicePosts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_service_posts_service_point_id")
                                .from(ServicePosts::Table, ServicePosts::ServicePointId)
                                .to(ServicePoints::Table, ServicePoints::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_service_posts_point_number")
                        .table(ServicePosts::Table)
                        .col(ServicePosts::ServicePointId)
                        .col(ServicePosts::PostNumber)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ServicePosts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(crate) enum ServicePosts {
        Table,
        Id,
        ServicePointId,
        Name,
        PostNumber,
        SlotDurationMinutes,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000004_create_services_tables {

    use super::m20240601_000002_create_service_points_table::ServicePoints;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000004_create_services_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Services::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Services::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Services::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Services::Description).text().null())
                        .col(
                            ColumnDef::new(Services::DefaultDurationMinutes)
                                .integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Services::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Services::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Services::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Pivot with a per-pair comment
            manager
                .create_table(
                    Table::create()
                        .table(ServicePointServices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ServicePointServices::ServicePointId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServicePointServices::ServiceId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ServicePointServices::Comment).text().null())
                        .col(
                            ColumnDef::new(ServicePointServices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(ServicePointServices::ServicePointId)
                                .col(ServicePointServices::ServiceId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_service_point_services_point_id")
                                .from(
                                    ServicePointServices::Table,
                                    ServicePointServices::ServicePointId,
                                )
                                .to(ServicePoints::Table, ServicePoints::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_service_point_services_service_id")
                                .from(
                                    ServicePointServices::Table,
                                    ServicePointServices::ServiceId,
                                )
                                .to(Services::Table, Services::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_service_point_services_service_id")
                        .table(ServicePointServices::Table)
                        .col(ServicePointServices::ServiceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ServicePointServices::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Services::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(crate) enum Services {
        Table,
        Id,
        Name,
        Description,
        DefaultDurationMinutes,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ServicePointServices {
        Table,
        ServicePointId,
        ServiceId,
        Comment,
        CreatedAt,
    }
}

mod m20240601_000005_create_service_point_photos_table {

    use super::m20240601_000002_create_service_points_table::ServicePoints;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000005_create_service_point_photos_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ServicePointPhotos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ServicePointPhotos::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServicePointPhotos::ServicePointId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ServicePointPhotos::Url).string().not_null())
                        .col(ColumnDef::new(ServicePointPhotos::Description).string().null())
                        .col(
                            ColumnDef::new(ServicePointPhotos::SortOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ServicePointPhotos::IsMain)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ServicePointPhotos::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_service_point_photos_point_id")
                                .from(
                                    ServicePointPhotos::Table,
                                    ServicePointPhotos::ServicePointId,
                                )
                                .to(ServicePoints::Table, ServicePoints::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_service_point_photos_point_id")
                        .table(ServicePointPhotos::Table)
                        .col(ServicePointPhotos::ServicePointId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ServicePointPhotos::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ServicePointPhotos {
        Table,
        Id,
        ServicePointId,
        Url,
        Description,
        SortOrder,
        IsMain,
        CreatedAt,
    }
}

mod m20240601_000006_create_schedules_table {

    use super::m20240601_000002_create_service_points_table::ServicePoints;
    use super::m20240601_000003_create_service_posts_table::ServicePosts;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000006_create_schedules_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Schedules::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Schedules::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Schedules::ServicePointId).uuid().not_null())
                        .col(ColumnDef::new(Schedules::ServicePostId).uuid().not_null())
                        .col(ColumnDef::new(Schedules::Date).date().not_null())
                        .col(ColumnDef::new(Schedules::StartTime).time().not_null())
                        .col(ColumnDef::new(Schedules::EndTime).time().not_null())
                        .col(
                            ColumnDef::new(Schedules::Status)
                                .string_len(16)
                                .not_null()
                                .default("available"),
                        )
                        .col(
                            ColumnDef::new(Schedules::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Schedules::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_schedules_service_point_id")
                                .from(Schedules::Table, Schedules::ServicePointId)
                                .to(ServicePoints::Table, ServicePoints::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_schedules_service_post_id")
                                .from(Schedules::Table, Schedules::ServicePostId)
                                .to(ServicePosts::Table, ServicePosts::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // One slot per post and start time: generation relies on it to stay idempotent
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_schedules_post_date_start")
                        .table(Schedules::Table)
                        .col(Schedules::ServicePostId)
                        .col(Schedules::Date)
                        .col(Schedules::StartTime)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_schedules_point_date_status")
                        .table(Schedules::Table)
                        .col(Schedules::ServicePointId)
                        .col(Schedules::Date)
                        .col(Schedules::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Schedules::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(crate) enum Schedules {
        Table,
        Id,
        ServicePointId,
        ServicePostId,
        Date,
        StartTime,
        EndTime,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000007_create_bookings_table {

    use super::m20240601_000002_create_service_points_table::ServicePoints;
    use super::m20240601_000004_create_services_tables::Services;
    use super::m20240601_000006_create_schedules_table::Schedules;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000007_create_bookings_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Bookings::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Bookings::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Bookings::ScheduleId).uuid().not_null())
                        .col(ColumnDef::new(Bookings::ServicePointId).uuid().not_null())
                        .col(ColumnDef::new(Bookings::ServiceId).uuid().null())
                        .col(ColumnDef::new(Bookings::BookingDate).date().not_null())
                        .col(ColumnDef::new(Bookings::StartTime).time().not_null())
                        .col(ColumnDef::new(Bookings::EndTime).time().not_null())
                        .col(ColumnDef::new(Bookings::ClientName).string().not_null())
                        .col(ColumnDef::new(Bookings::ClientPhone).string().not_null())
                        .col(ColumnDef::new(Bookings::ClientEmail).string().null())
                        .col(ColumnDef::new(Bookings::CarBrand).string().null())
                        .col(ColumnDef::new(Bookings::CarModel).string().null())
                        .col(ColumnDef::new(Bookings::LicensePlate).string().null())
                        .col(ColumnDef::new(Bookings::Comment).text().null())
                        .col(
                            ColumnDef::new(Bookings::Status)
                                .string_len(16)
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(Bookings::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Bookings::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bookings_schedule_id")
                                .from(Bookings::Table, Bookings::ScheduleId)
                                .to(Schedules::Table, Schedules::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bookings_service_point_id")
                                .from(Bookings::Table, Bookings::ServicePointId)
                                .to(ServicePoints::Table, ServicePoints::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bookings_service_id")
                                .from(Bookings::Table, Bookings::ServiceId)
                                .to(Services::Table, Services::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bookings_schedule_id")
                        .table(Bookings::Table)
                        .col(Bookings::ScheduleId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bookings_point_date")
                        .table(Bookings::Table)
                        .col(Bookings::ServicePointId)
                        .col(Bookings::BookingDate)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bookings_status")
                        .table(Bookings::Table)
                        .col(Bookings::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Bookings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Bookings {
        Table,
        Id,
        ScheduleId,
        ServicePointId,
        ServiceId,
        BookingDate,
        StartTime,
        EndTime,
        ClientName,
        ClientPhone,
        ClientEmail,
        CarBrand,
        CarModel,
        LicensePlate,
        Comment,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}
