//! Dialect query table: logical operation → parameterized SQL.
//!
//! SQL is written once with `?` markers, `{user_table}` and `{now}`
//! placeholders and rendered per dialect when the table is built.

use dextrack_core::Dialect;

/// Logical operations issued by the stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Query {
    CreateUser,
    GetUser,
    AddCaughtSet,
    GetCaughtSet,
    UpdateCaughtSet,
    GetCached,
    UpsertCache,
}

impl Query {
    pub const ALL: [Query; 7] = [
        Query::CreateUser,
        Query::GetUser,
        Query::AddCaughtSet,
        Query::GetCaughtSet,
        Query::UpdateCaughtSet,
        Query::GetCached,
        Query::UpsertCache,
    ];

    /// Stable operation name, used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Query::CreateUser => "create_user",
            Query::GetUser => "get_user",
            Query::AddCaughtSet => "add_gen_data",
            Query::GetCaughtSet => "get_gen_data",
            Query::UpdateCaughtSet => "update_gen",
            Query::GetCached => "get_cached",
            Query::UpsertCache => "cache_data",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Query::CreateUser => "INSERT INTO {user_table} (username, password) VALUES (?, ?)",
            Query::GetUser => {
                "SELECT id, username FROM {user_table} WHERE username = ? AND password = ?"
            }
            Query::AddCaughtSet => {
                "INSERT INTO caught (user_id, pokemon_ids, generation) VALUES (?, ?, ?)"
            }
            Query::GetCaughtSet => {
                "SELECT user_id, pokemon_ids, generation FROM caught WHERE user_id = ? AND generation = ?"
            }
            Query::UpdateCaughtSet => {
                "UPDATE caught SET pokemon_ids = ? WHERE user_id = ? AND generation = ?"
            }
            Query::GetCached => {
                "SELECT id, gen_id, name, img, updated_at FROM cache WHERE gen_id = ? ORDER BY id"
            }
            Query::UpsertCache => {
                r#"
                INSERT INTO cache (id, name, img, gen_id) VALUES (?, ?, ?, ?)
                ON CONFLICT(gen_id, id) DO UPDATE SET
                    name = excluded.name,
                    img = excluded.img,
                    updated_at = {now}
                "#
            }
        }
    }
}

/// SQL text for every [`Query`], rendered for one dialect.
#[derive(Clone, Debug)]
pub struct QueryTable {
    dialect: Dialect,
    statements: Vec<String>,
}

impl QueryTable {
    pub fn new(dialect: Dialect) -> Self {
        let statements = Query::ALL
            .iter()
            .map(|query| render(dialect, query.template()))
            .collect();
        Self {
            dialect,
            statements,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// SQL text for an operation.
    pub fn get(&self, query: Query) -> &str {
        // Statements are built in `Query::ALL` order, which matches declaration order.
        &self.statements[query as usize]
    }
}

fn render(dialect: Dialect, template: &str) -> String {
    let (user_table, now) = match dialect {
        Dialect::Sqlite => ("pkm_user", "CURRENT_TIMESTAMP"),
        Dialect::Postgres => (r#""pkm_user""#, "NOW()"),
    };
    let sql = template
        .replace("{user_table}", user_table)
        .replace("{now}", now);
    match dialect {
        Dialect::Sqlite => sql,
        Dialect::Postgres => number_placeholders(&sql),
    }
}

/// Rewrite `?` markers as `$1, $2, ...`.
fn number_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0;
    for ch in sql.chars() {
        if ch == '?' {
            index += 1;
            out.push('$');
            out.push_str(&index.to_string());
        } else {
            out.push(ch);
        }
    }
    out
}
