//! Shared `Schema` fixtures covering the end-to-end scenarios in the
//! db-editor design notes: cascade nesting, self-reference, multi-parent
//! tie-break, and a mutual-composition cycle.

use db_editor_core::schema::types::{
    Column, DataType, ForeignKeyAction, Relationship, Schema, Table, UniqueConstraint,
};

fn pk_column(name: &str) -> Column {
    let mut col = Column::new(name.to_string(), DataType::Integer, "integer".to_string());
    col.is_nullable = false;
    col
}

fn text_column(name: &str, nullable: bool) -> Column {
    let mut col = Column::new(name.to_string(), DataType::VarChar, "character varying".to_string());
    col.is_nullable = nullable;
    col
}

/// An e-commerce-shaped schema: cascade nesting (organization -> project ->
/// task), a self-referencing FK that stays a reference (category), and a
/// reference FK with `ON DELETE SET NULL` (product -> category).
pub fn ecommerce_schema() -> Schema {
    let mut schema = Schema::new();

    let mut organization = Table::new("organization".to_string());
    organization.columns.insert("id".to_string(), pk_column("id"));
    organization.columns.insert("name".to_string(), text_column("name", false));
    organization.primary_key = vec!["id".to_string()];
    schema.tables.insert("organization".to_string(), organization);

    let mut project = Table::new("project".to_string());
    project.columns.insert("id".to_string(), pk_column("id"));
    project.columns.insert("name".to_string(), text_column("name", false));
    project.columns.insert("organization_id".to_string(), {
        let mut c = Column::new("organization_id".to_string(), DataType::Integer, "integer".to_string());
        c.is_nullable = false;
        c
    });
    project.primary_key = vec!["id".to_string()];
    schema.tables.insert("project".to_string(), project);
    schema.relationships.push(Relationship {
        id: "project_organization_id_fkey".to_string(),
        from_table: "project".to_string(),
        from_columns: vec!["organization_id".to_string()],
        to_table: "organization".to_string(),
        to_columns: vec!["id".to_string()],
        on_delete: ForeignKeyAction::Cascade,
        on_update: ForeignKeyAction::NoAction,
    });

    let mut task = Table::new("task".to_string());
    task.columns.insert("id".to_string(), pk_column("id"));
    task.columns.insert("title".to_string(), text_column("title", false));
    task.columns.insert("project_id".to_string(), {
        let mut c = Column::new("project_id".to_string(), DataType::Integer, "integer".to_string());
        c.is_nullable = false;
        c
    });
    task.primary_key = vec!["id".to_string()];
    schema.tables.insert("task".to_string(), task);
    schema.relationships.push(Relationship {
        id: "task_project_id_fkey".to_string(),
        from_table: "task".to_string(),
        from_columns: vec!["project_id".to_string()],
        to_table: "project".to_string(),
        to_columns: vec!["id".to_string()],
        on_delete: ForeignKeyAction::Cascade,
        on_update: ForeignKeyAction::NoAction,
    });

    let mut category = Table::new("category".to_string());
    category.columns.insert("id".to_string(), pk_column("id"));
    category.columns.insert("name".to_string(), text_column("name", false));
    category.columns.insert("parent_id".to_string(), {
        let mut c = Column::new("parent_id".to_string(), DataType::Integer, "integer".to_string());
        c.is_nullable = true;
        c
    });
    category.primary_key = vec!["id".to_string()];
    schema.tables.insert("category".to_string(), category);
    schema.relationships.push(Relationship {
        id: "category_parent_id_fkey".to_string(),
        from_table: "category".to_string(),
        from_columns: vec!["parent_id".to_string()],
        to_table: "category".to_string(),
        to_columns: vec!["id".to_string()],
        on_delete: ForeignKeyAction::Cascade,
        on_update: ForeignKeyAction::NoAction,
    });

    let mut product = Table::new("product".to_string());
    product.columns.insert("id".to_string(), pk_column("id"));
    product.columns.insert("name".to_string(), text_column("name", false));
    product.columns.insert("category_id".to_string(), {
        let mut c = Column::new("category_id".to_string(), DataType::Integer, "integer".to_string());
        c.is_nullable = true;
        c
    });
    product.primary_key = vec!["id".to_string()];
    product.unique_constraints.push(UniqueConstraint {
        name: Some("product_name_key".to_string()),
        columns: vec!["name".to_string()],
    });
    schema.tables.insert("product".to_string(), product);
    schema.relationships.push(Relationship {
        id: "product_category_id_fkey".to_string(),
        from_table: "product".to_string(),
        from_columns: vec!["category_id".to_string()],
        to_table: "category".to_string(),
        to_columns: vec!["id".to_string()],
        on_delete: ForeignKeyAction::SetNull,
        on_update: ForeignKeyAction::NoAction,
    });

    schema
}

/// `User(id PK)`, `Project(id PK)`, `Membership(id PK, userId FK->User
/// CASCADE, projectId FK->Project CASCADE)` — dominant parent must be
/// `project` (alphabetically first among the two single-column FKs).
pub fn multi_parent_schema() -> Schema {
    let mut schema = Schema::new();

    let mut user = Table::new("user".to_string());
    user.columns.insert("id".to_string(), pk_column("id"));
    user.primary_key = vec!["id".to_string()];
    schema.tables.insert("user".to_string(), user);

    let mut project = Table::new("project".to_string());
    project.columns.insert("id".to_string(), pk_column("id"));
    project.primary_key = vec!["id".to_string()];
    schema.tables.insert("project".to_string(), project);

    let mut membership = Table::new("membership".to_string());
    membership.columns.insert("id".to_string(), pk_column("id"));
    membership.columns.insert("user_id".to_string(), {
        let mut c = Column::new("user_id".to_string(), DataType::Integer, "integer".to_string());
        c.is_nullable = false;
        c
    });
    membership.columns.insert("project_id".to_string(), {
        let mut c = Column::new("project_id".to_string(), DataType::Integer, "integer".to_string());
        c.is_nullable = false;
        c
    });
    membership.primary_key = vec!["id".to_string()];
    schema.tables.insert("membership".to_string(), membership);

    schema.relationships.push(Relationship {
        id: "membership_user_id_fkey".to_string(),
        from_table: "membership".to_string(),
        from_columns: vec!["user_id".to_string()],
        to_table: "user".to_string(),
        to_columns: vec!["id".to_string()],
        on_delete: ForeignKeyAction::Cascade,
        on_update: ForeignKeyAction::NoAction,
    });
    schema.relationships.push(Relationship {
        id: "membership_project_id_fkey".to_string(),
        from_table: "membership".to_string(),
        from_columns: vec!["project_id".to_string()],
        to_table: "project".to_string(),
        to_columns: vec!["id".to_string()],
        on_delete: ForeignKeyAction::Cascade,
        on_update: ForeignKeyAction::NoAction,
    });

    schema
}

/// Two tables with a mutual `ON DELETE CASCADE` FK — no acyclic dominant
/// choice exists, so ownership-tree construction must fail.
pub fn cyclic_schema() -> Schema {
    let mut schema = Schema::new();

    let mut table_a = Table::new("table_a".to_string());
    table_a.columns.insert("id".to_string(), pk_column("id"));
    table_a.columns.insert("b_id".to_string(), {
        let mut c = Column::new("b_id".to_string(), DataType::Integer, "integer".to_string());
        c.is_nullable = true;
        c
    });
    table_a.primary_key = vec!["id".to_string()];
    schema.tables.insert("table_a".to_string(), table_a);

    let mut table_b = Table::new("table_b".to_string());
    table_b.columns.insert("id".to_string(), pk_column("id"));
    table_b.columns.insert("a_id".to_string(), {
        let mut c = Column::new("a_id".to_string(), DataType::Integer, "integer".to_string());
        c.is_nullable = true;
        c
    });
    table_b.primary_key = vec!["id".to_string()];
    schema.tables.insert("table_b".to_string(), table_b);

    schema.relationships.push(Relationship {
        id: "table_a_b_id_fkey".to_string(),
        from_table: "table_a".to_string(),
        from_columns: vec!["b_id".to_string()],
        to_table: "table_b".to_string(),
        to_columns: vec!["id".to_string()],
        on_delete: ForeignKeyAction::Cascade,
        on_update: ForeignKeyAction::NoAction,
    });
    schema.relationships.push(Relationship {
        id: "table_b_a_id_fkey".to_string(),
        from_table: "table_b".to_string(),
        from_columns: vec!["a_id".to_string()],
        to_table: "table_a".to_string(),
        to_columns: vec!["id".to_string()],
        on_delete: ForeignKeyAction::Cascade,
        on_update: ForeignKeyAction::NoAction,
    });

    schema
}
