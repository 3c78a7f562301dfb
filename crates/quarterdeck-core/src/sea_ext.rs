use sea_orm::ColumnTrait;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, SimpleExpr};

/// Escape LIKE metacharacters so user-supplied search terms match literally.
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Case-insensitive substring match, the building block of free-text search.
pub trait IlikeContains {
    /// `column ILIKE '%term%'` with `term` escaped.
    fn ilike_contains(self, term: &str) -> SimpleExpr;
}

impl<C> IlikeContains for C
where
    C: ColumnTrait,
{
    fn ilike_contains(self, term: &str) -> SimpleExpr {
        Expr::col(self).ilike(format!("%{}%", escape_like(term)))
    }
}
