use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Account {
    Table,
    Id,
    Username,
    PasswordHash,
    Role,
}

#[derive(DeriveIden)]
enum Department {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum JobRole {
    #[sea_orm(iden = "role")]
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Employee {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    DepartmentId,
    RoleId,
}

#[derive(DeriveIden)]
enum PerformanceReview {
    Table,
    Id,
    EmployeeId,
    ReviewDate,
    Comments,
    Rating,
}

// Reference columns (employee.department_id, employee.role_id,
// performance_review.employee_id) are plain integers without FK constraints:
// deleting a referenced row succeeds and the dangling reference stays
// readable. The DDL avoids backend-specific defaults so the same migration
// runs on Postgres and on the SQLite test databases.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Account::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Account::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Account::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Account::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Account::Role).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Department::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Department::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Department::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JobRole::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JobRole::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(JobRole::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Employee::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Employee::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Employee::FirstName).string().not_null())
                    .col(ColumnDef::new(Employee::LastName).string().not_null())
                    .col(
                        ColumnDef::new(Employee::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Employee::DepartmentId).integer())
                    .col(ColumnDef::new(Employee::RoleId).integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PerformanceReview::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PerformanceReview::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PerformanceReview::EmployeeId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PerformanceReview::ReviewDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PerformanceReview::Comments).text().not_null())
                    .col(ColumnDef::new(PerformanceReview::Rating).integer().not_null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PerformanceReview::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Employee::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JobRole::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Department::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Account::Table).to_owned())
            .await?;
        Ok(())
    }
}
