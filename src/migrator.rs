use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_catalog_tables::Migration),
            Box::new(m20240301_000002_create_customer_tables::Migration),
            Box::new(m20240301_000003_create_order_tables::Migration),
            Box::new(m20240301_000004_create_engagement_tables::Migration),
        ]
    }
}

fn id_column<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn cascade_fk<T, C, R, P>(name: &str, table: T, column: C, ref_table: R, ref_column: P) -> ForeignKeyCreateStatement
where
    T: IntoIden + 'static,
    C: IntoIden,
    R: IntoIden + 'static,
    P: IntoIden,
{
    ForeignKey::create()
        .name(name)
        .from(table, column)
        .to(ref_table, ref_column)
        .on_delete(ForeignKeyAction::Cascade)
        .on_update(ForeignKeyAction::Cascade)
        .to_owned()
}

// Migration implementations

mod m20240301_000001_create_catalog_tables {
    use super::{cascade_fk, id_column};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Members::Table)
                        .if_not_exists()
                        .col(id_column(Members::Id))
                        .col(ColumnDef::new(Members::FirstName).string_len(100).not_null())
                        .col(ColumnDef::new(Members::LastName).string_len(100).not_null())
                        .col(
                            ColumnDef::new(Members::Email)
                                .string_len(254)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Members::PhoneNumber).string_len(20).null())
                        .col(ColumnDef::new(Members::DateOfBirth).date().null())
                        .col(ColumnDef::new(Members::Bio).text().null())
                        .col(ColumnDef::new(Members::ProfilePicture).string_len(255).null())
                        .col(ColumnDef::new(Members::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Members::UpdatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Brands::Table)
                        .if_not_exists()
                        .col(id_column(Brands::Id))
                        .col(
                            ColumnDef::new(Brands::BrandName)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Brands::Description).text().null())
                        .col(ColumnDef::new(Brands::WebsiteUrl).string_len(200).null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(id_column(Categories::Id))
                        .col(
                            ColumnDef::new(Categories::CategoryName)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Categories::ParentCategoryId).integer().null())
                        .col(ColumnDef::new(Categories::Description).text().null())
                        .foreign_key(&mut cascade_fk(
                            "fk_categories_parent",
                            Categories::Table,
                            Categories::ParentCategoryId,
                            Categories::Table,
                            Categories::Id,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(id_column(Products::Id))
                        .col(ColumnDef::new(Products::ProductName).string_len(200).not_null())
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(ColumnDef::new(Products::BrandId).integer().null())
                        .col(ColumnDef::new(Products::CategoryId).integer().null())
                        .col(ColumnDef::new(Products::Gender).string_len(1).null())
                        .col(ColumnDef::new(Products::Price).decimal_len(10, 2).not_null())
                        .col(ColumnDef::new(Products::Material).string_len(100).null())
                        .col(ColumnDef::new(Products::CareInstructions).text().null())
                        .col(
                            ColumnDef::new(Products::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Products::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp_with_time_zone().not_null())
                        .foreign_key(&mut cascade_fk(
                            "fk_products_brand",
                            Products::Table,
                            Products::BrandId,
                            Brands::Table,
                            Brands::Id,
                        ))
                        .foreign_key(&mut cascade_fk(
                            "fk_products_category",
                            Products::Table,
                            Products::CategoryId,
                            Categories::Table,
                            Categories::Id,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductVariants::Table)
                        .if_not_exists()
                        .col(id_column(ProductVariants::Id))
                        .col(ColumnDef::new(ProductVariants::ProductId).integer().not_null())
                        .col(ColumnDef::new(ProductVariants::Color).string_len(50).not_null())
                        .col(ColumnDef::new(ProductVariants::Size).string_len(20).not_null())
                        .col(
                            ColumnDef::new(ProductVariants::Sku)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::QuantityInStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(&mut cascade_fk(
                            "fk_product_variants_product",
                            ProductVariants::Table,
                            ProductVariants::ProductId,
                            Products::Table,
                            Products::Id,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ux_product_variants_product_color_size")
                        .table(ProductVariants::Table)
                        .col(ProductVariants::ProductId)
                        .col(ProductVariants::Color)
                        .col(ProductVariants::Size)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductImages::Table)
                        .if_not_exists()
                        .col(id_column(ProductImages::Id))
                        .col(ColumnDef::new(ProductImages::ProductId).integer().not_null())
                        .col(ColumnDef::new(ProductImages::VariantId).integer().null())
                        .col(ColumnDef::new(ProductImages::Image).string_len(255).not_null())
                        .col(ColumnDef::new(ProductImages::AltText).string_len(255).null())
                        .col(
                            ColumnDef::new(ProductImages::IsThumbnail)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ProductImages::DisplayOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(&mut cascade_fk(
                            "fk_product_images_product",
                            ProductImages::Table,
                            ProductImages::ProductId,
                            Products::Table,
                            Products::Id,
                        ))
                        .foreign_key(&mut cascade_fk(
                            "fk_product_images_variant",
                            ProductImages::Table,
                            ProductImages::VariantId,
                            ProductVariants::Table,
                            ProductVariants::Id,
                        ))
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductImages::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductVariants::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Brands::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Members::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Members {
        Table,
        Id,
        FirstName,
        LastName,
        Email,
        PhoneNumber,
        DateOfBirth,
        Bio,
        ProfilePicture,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Brands {
        Table,
        Id,
        BrandName,
        Description,
        WebsiteUrl,
    }

    #[derive(DeriveIden)]
    pub(super) enum Categories {
        Table,
        Id,
        CategoryName,
        ParentCategoryId,
        Description,
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        ProductName,
        Description,
        BrandId,
        CategoryId,
        Gender,
        Price,
        Material,
        CareInstructions,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductVariants {
        Table,
        Id,
        ProductId,
        Color,
        Size,
        Sku,
        QuantityInStock,
    }

    #[derive(DeriveIden)]
    enum ProductImages {
        Table,
        Id,
        ProductId,
        VariantId,
        Image,
        AltText,
        IsThumbnail,
        DisplayOrder,
    }
}

mod m20240301_000002_create_customer_tables {
    use super::m20240301_000001_create_catalog_tables::ProductVariants;
    use super::{cascade_fk, id_column};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_customer_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(id_column(Customers::Id))
                        .col(ColumnDef::new(Customers::FirstName).string_len(100).not_null())
                        .col(ColumnDef::new(Customers::LastName).string_len(100).not_null())
                        .col(
                            ColumnDef::new(Customers::Email)
                                .string_len(254)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Customers::PasswordHash).string_len(255).not_null())
                        .col(ColumnDef::new(Customers::PhoneNumber).string_len(20).null())
                        .col(
                            ColumnDef::new(Customers::RegistrationDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Customers::LastLogin).timestamp_with_time_zone().null())
                        .col(ColumnDef::new(Customers::ProfilePicture).string_len(255).null())
                        .col(ColumnDef::new(Customers::Notes).text().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Addresses::Table)
                        .if_not_exists()
                        .col(id_column(Addresses::Id))
                        .col(ColumnDef::new(Addresses::CustomerId).integer().not_null())
                        .col(ColumnDef::new(Addresses::AddressLine1).string_len(255).not_null())
                        .col(ColumnDef::new(Addresses::AddressLine2).string_len(255).null())
                        .col(ColumnDef::new(Addresses::City).string_len(100).not_null())
                        .col(ColumnDef::new(Addresses::StateProvince).string_len(100).null())
                        .col(ColumnDef::new(Addresses::PostalCode).string_len(20).not_null())
                        .col(ColumnDef::new(Addresses::Country).string_len(100).not_null())
                        .col(ColumnDef::new(Addresses::AddressType).string_len(1).not_null())
                        .col(
                            ColumnDef::new(Addresses::IsDefault)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .foreign_key(&mut cascade_fk(
                            "fk_addresses_customer",
                            Addresses::Table,
                            Addresses::CustomerId,
                            Customers::Table,
                            Customers::Id,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Carts::Table)
                        .if_not_exists()
                        .col(id_column(Carts::Id))
                        .col(ColumnDef::new(Carts::CustomerId).integer().null().unique_key())
                        .col(ColumnDef::new(Carts::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Carts::UpdatedAt).timestamp_with_time_zone().not_null())
                        .foreign_key(&mut cascade_fk(
                            "fk_carts_customer",
                            Carts::Table,
                            Carts::CustomerId,
                            Customers::Table,
                            Customers::Id,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CartItems::Table)
                        .if_not_exists()
                        .col(id_column(CartItems::Id))
                        .col(ColumnDef::new(CartItems::CartId).integer().not_null())
                        .col(ColumnDef::new(CartItems::VariantId).integer().not_null())
                        .col(
                            ColumnDef::new(CartItems::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(CartItems::AddedAt).timestamp_with_time_zone().not_null())
                        .foreign_key(&mut cascade_fk(
                            "fk_cart_items_cart",
                            CartItems::Table,
                            CartItems::CartId,
                            Carts::Table,
                            Carts::Id,
                        ))
                        .foreign_key(&mut cascade_fk(
                            "fk_cart_items_variant",
                            CartItems::Table,
                            CartItems::VariantId,
                            ProductVariants::Table,
                            ProductVariants::Id,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ux_cart_items_cart_variant")
                        .table(CartItems::Table)
                        .col(CartItems::CartId)
                        .col(CartItems::VariantId)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Wishlists::Table)
                        .if_not_exists()
                        .col(id_column(Wishlists::Id))
                        .col(ColumnDef::new(Wishlists::CustomerId).integer().not_null())
                        .col(ColumnDef::new(Wishlists::VariantId).integer().not_null())
                        .col(ColumnDef::new(Wishlists::AddedDate).timestamp_with_time_zone().not_null())
                        .foreign_key(&mut cascade_fk(
                            "fk_wishlists_customer",
                            Wishlists::Table,
                            Wishlists::CustomerId,
                            Customers::Table,
                            Customers::Id,
                        ))
                        .foreign_key(&mut cascade_fk(
                            "fk_wishlists_variant",
                            Wishlists::Table,
                            Wishlists::VariantId,
                            ProductVariants::Table,
                            ProductVariants::Id,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ux_wishlists_customer_variant")
                        .table(Wishlists::Table)
                        .col(Wishlists::CustomerId)
                        .col(Wishlists::VariantId)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                Wishlists::Table.into_iden(),
                CartItems::Table.into_iden(),
                Carts::Table.into_iden(),
                Addresses::Table.into_iden(),
                Customers::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Customers {
        Table,
        Id,
        FirstName,
        LastName,
        Email,
        PasswordHash,
        PhoneNumber,
        RegistrationDate,
        LastLogin,
        ProfilePicture,
        Notes,
    }

    #[derive(DeriveIden)]
    pub(super) enum Addresses {
        Table,
        Id,
        CustomerId,
        AddressLine1,
        AddressLine2,
        City,
        StateProvince,
        PostalCode,
        Country,
        AddressType,
        IsDefault,
    }

    #[derive(DeriveIden)]
    enum Carts {
        Table,
        Id,
        CustomerId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum CartItems {
        Table,
        Id,
        CartId,
        VariantId,
        Quantity,
        AddedAt,
    }

    #[derive(DeriveIden)]
    enum Wishlists {
        Table,
        Id,
        CustomerId,
        VariantId,
        AddedDate,
    }
}

mod m20240301_000003_create_order_tables {
    use super::m20240301_000001_create_catalog_tables::ProductVariants;
    use super::m20240301_000002_create_customer_tables::{Addresses, Customers};
    use super::{cascade_fk, id_column};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(id_column(Orders::Id))
                        .col(ColumnDef::new(Orders::CustomerId).integer().null())
                        .col(ColumnDef::new(Orders::OrderDate).timestamp_with_time_zone().not_null())
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::ShippingAddressId).integer().null())
                        .col(ColumnDef::new(Orders::BillingAddressId).integer().null())
                        .col(
                            ColumnDef::new(Orders::OrderStatus)
                                .string_len(20)
                                .not_null()
                                .default("PENDING"),
                        )
                        .col(
                            ColumnDef::new(Orders::PaymentStatus)
                                .string_len(20)
                                .not_null()
                                .default("PENDING"),
                        )
                        .col(ColumnDef::new(Orders::ShippingMethod).string_len(100).null())
                        .col(ColumnDef::new(Orders::TrackingNumber).string_len(100).null())
                        .foreign_key(&mut cascade_fk(
                            "fk_orders_customer",
                            Orders::Table,
                            Orders::CustomerId,
                            Customers::Table,
                            Customers::Id,
                        ))
                        .foreign_key(&mut cascade_fk(
                            "fk_orders_shipping_address",
                            Orders::Table,
                            Orders::ShippingAddressId,
                            Addresses::Table,
                            Addresses::Id,
                        ))
                        .foreign_key(&mut cascade_fk(
                            "fk_orders_billing_address",
                            Orders::Table,
                            Orders::BillingAddressId,
                            Addresses::Table,
                            Addresses::Id,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_order_date")
                        .table(Orders::Table)
                        .col(Orders::OrderDate)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(id_column(OrderItems::Id))
                        .col(ColumnDef::new(OrderItems::OrderId).integer().not_null())
                        .col(ColumnDef::new(OrderItems::VariantId).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(OrderItems::PriceAtPurchase)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .foreign_key(&mut cascade_fk(
                            "fk_order_items_order",
                            OrderItems::Table,
                            OrderItems::OrderId,
                            Orders::Table,
                            Orders::Id,
                        ))
                        .foreign_key(&mut cascade_fk(
                            "fk_order_items_variant",
                            OrderItems::Table,
                            OrderItems::VariantId,
                            ProductVariants::Table,
                            ProductVariants::Id,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ux_order_items_order_variant")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .col(OrderItems::VariantId)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Orders {
        Table,
        Id,
        CustomerId,
        OrderDate,
        TotalAmount,
        ShippingAddressId,
        BillingAddressId,
        OrderStatus,
        PaymentStatus,
        ShippingMethod,
        TrackingNumber,
    }

    #[derive(DeriveIden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        VariantId,
        Quantity,
        PriceAtPurchase,
    }
}

mod m20240301_000004_create_engagement_tables {
    use super::m20240301_000001_create_catalog_tables::Products;
    use super::m20240301_000002_create_customer_tables::Customers;
    use super::m20240301_000003_create_order_tables::Orders;
    use super::{cascade_fk, id_column};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_engagement_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Reviews::Table)
                        .if_not_exists()
                        .col(id_column(Reviews::Id))
                        .col(ColumnDef::new(Reviews::ProductId).integer().not_null())
                        .col(ColumnDef::new(Reviews::CustomerId).integer().null())
                        .col(ColumnDef::new(Reviews::Rating).integer().not_null())
                        .col(ColumnDef::new(Reviews::ReviewText).text().null())
                        .col(ColumnDef::new(Reviews::ReviewDate).timestamp_with_time_zone().not_null())
                        .col(
                            ColumnDef::new(Reviews::IsApproved)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .foreign_key(&mut cascade_fk(
                            "fk_reviews_product",
                            Reviews::Table,
                            Reviews::ProductId,
                            Products::Table,
                            Products::Id,
                        ))
                        .foreign_key(&mut cascade_fk(
                            "fk_reviews_customer",
                            Reviews::Table,
                            Reviews::CustomerId,
                            Customers::Table,
                            Customers::Id,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ux_reviews_product_customer")
                        .table(Reviews::Table)
                        .col(Reviews::ProductId)
                        .col(Reviews::CustomerId)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Promotions::Table)
                        .if_not_exists()
                        .col(id_column(Promotions::Id))
                        .col(
                            ColumnDef::new(Promotions::PromoCode)
                                .string_len(50)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Promotions::Description).text().null())
                        .col(ColumnDef::new(Promotions::DiscountType).string_len(20).not_null())
                        .col(ColumnDef::new(Promotions::DiscountValue).decimal_len(10, 2).not_null())
                        .col(ColumnDef::new(Promotions::StartDate).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Promotions::EndDate).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Promotions::MinOrderAmount).decimal_len(10, 2).null())
                        .col(ColumnDef::new(Promotions::UsageLimit).integer().null())
                        .col(ColumnDef::new(Promotions::PerCustomerLimit).integer().null())
                        .col(
                            ColumnDef::new(Promotions::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AppliedPromotions::Table)
                        .if_not_exists()
                        .col(id_column(AppliedPromotions::Id))
                        .col(ColumnDef::new(AppliedPromotions::OrderId).integer().not_null())
                        .col(ColumnDef::new(AppliedPromotions::PromotionId).integer().not_null())
                        .col(
                            ColumnDef::new(AppliedPromotions::DiscountApplied)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AppliedPromotions::AppliedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(&mut cascade_fk(
                            "fk_applied_promotions_order",
                            AppliedPromotions::Table,
                            AppliedPromotions::OrderId,
                            Orders::Table,
                            Orders::Id,
                        ))
                        .foreign_key(&mut cascade_fk(
                            "fk_applied_promotions_promotion",
                            AppliedPromotions::Table,
                            AppliedPromotions::PromotionId,
                            Promotions::Table,
                            Promotions::Id,
                        ))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("ux_applied_promotions_order_promotion")
                        .table(AppliedPromotions::Table)
                        .col(AppliedPromotions::OrderId)
                        .col(AppliedPromotions::PromotionId)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AppliedPromotions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Promotions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Reviews::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Reviews {
        Table,
        Id,
        ProductId,
        CustomerId,
        Rating,
        ReviewText,
        ReviewDate,
        IsApproved,
    }

    #[derive(DeriveIden)]
    enum Promotions {
        Table,
        Id,
        PromoCode,
        Description,
        DiscountType,
        DiscountValue,
        StartDate,
        EndDate,
        MinOrderAmount,
        UsageLimit,
        PerCustomerLimit,
        IsActive,
    }

    #[derive(DeriveIden)]
    enum AppliedPromotions {
        Table,
        Id,
        OrderId,
        PromotionId,
        DiscountApplied,
        AppliedAt,
    }
}
