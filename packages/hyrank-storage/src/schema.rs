pub fn render_schema(vector_dim: u32) -> String {
	let init = include_str!("../../../sql/init.sql");
	let expanded = expand_includes(init);

	expanded.replace("<VECTOR_DIM>", &vector_dim.to_string())
}

/// Splits rendered SQL into executable statements. The schema files contain no `;` inside
/// literals or bodies.
pub fn statements(sql: &str) -> impl Iterator<Item = &str> {
	sql.split(';').map(str::trim).filter(|statement| !statement.is_empty())
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let included = match line.trim().strip_prefix("\\ir ").map(str::trim) {
			Some("00_extensions.sql") => Some(include_str!("../../../sql/00_extensions.sql")),
			Some("tables/001_documents.sql") =>
				Some(include_str!("../../../sql/tables/001_documents.sql")),
			Some("tables/002_demo_queries.sql") =>
				Some(include_str!("../../../sql/tables/002_demo_queries.sql")),
			Some("tables/003_corpus_versions.sql") =>
				Some(include_str!("../../../sql/tables/003_corpus_versions.sql")),
			_ => None,
		};

		out.push_str(included.unwrap_or(line));
		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use crate::schema::{render_schema, statements};

	#[test]
	fn renders_vector_dimension_into_every_table() {
		let sql = render_schema(8);

		assert!(!sql.contains("<VECTOR_DIM>"));
		assert!(!sql.contains("\\ir "));
		assert_eq!(sql.matches("vector(8)").count(), 2);
	}

	#[test]
	fn documents_table_is_partitioned_on_created_at() {
		let sql = render_schema(8);

		assert!(sql.contains("PRIMARY KEY (id, created_at)"));
		assert!(sql.contains("create_hypertable("));
		assert!(sql.contains("setweight(to_tsvector('english', COALESCE(title, '')), 'A')"));
	}

	#[test]
	fn statements_skip_blank_fragments() {
		let sql = render_schema(8);
		let parsed = statements(&sql).collect::<Vec<_>>();

		assert!(parsed.iter().all(|statement| !statement.is_empty()));
		assert!(
			parsed
				.iter()
				.any(|statement| statement.starts_with("CREATE TABLE IF NOT EXISTS documents"))
		);
	}
}
