//! Cart service functions with database access.
//!
//! Every write goes through one transaction that locks the cart row, applies
//! the change in memory, re-saves all lines at current prices and stores the
//! recomputed totals.

use std::collections::{BTreeMap, HashMap};

use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, Result};
use crate::models::{Cart, CartOwner, CartProduct, Product, ProductKind, ProductRef};

use super::calculators::{CartAction, CartContents, CartLine, CartMutation, PriceBook};
use super::queries;

/// A line item with the product it references
#[derive(Debug, Clone)]
pub struct CartItem {
    pub line: CartProduct,
    pub product: Product,
}

/// Cart with resolved line items
#[derive(Debug, Clone)]
pub struct CartView {
    pub cart: Cart,
    pub items: Vec<CartItem>,
}

impl CartView {
    fn assemble(
        cart: Cart,
        lines: Vec<CartProduct>,
        products: &HashMap<ProductRef, Product>,
    ) -> Result<Self> {
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            match products.get(&line.reference()?) {
                Some(product) => items.push(CartItem {
                    product: product.clone(),
                    line,
                }),
                None => warn!(
                    "Cart {} line {} references missing {} #{}",
                    cart.id, line.id, line.product_kind, line.object_id
                ),
            }
        }
        Ok(CartView { cart, items })
    }
}

/// Resolve product references, one query per kind.
async fn load_products(
    conn: &mut PgConnection,
    refs: impl IntoIterator<Item = ProductRef>,
) -> Result<HashMap<ProductRef, Product>> {
    let mut by_kind: BTreeMap<ProductKind, Vec<i32>> = BTreeMap::new();
    for product in refs {
        by_kind.entry(product.kind).or_default().push(product.id);
    }

    let mut products = HashMap::new();
    for (kind, ids) in by_kind {
        for product in db::get_products_by_ids(&mut *conn, kind, &ids).await? {
            products.insert(product.reference(), product);
        }
    }
    Ok(products)
}

async fn load_contents(
    conn: &mut PgConnection,
    cart_id: i32,
) -> Result<(CartContents, HashMap<ProductRef, Product>)> {
    let rows = queries::get_cart_lines(&mut *conn, cart_id).await?;
    let lines = rows
        .iter()
        .map(CartLine::try_from)
        .collect::<Result<Vec<_>>>()?;
    let products = load_products(conn, lines.iter().map(|l| l.product)).await?;
    Ok((CartContents::new(lines)?, products))
}

/// Reprice every line, persist lines and totals.
async fn save_contents(
    conn: &mut PgConnection,
    cart: &Cart,
    mut contents: CartContents,
    removed: Vec<CartLine>,
    products: &HashMap<ProductRef, Product>,
) -> Result<(Cart, Vec<CartProduct>)> {
    let prices: PriceBook = products.iter().map(|(r, p)| (*r, p.price)).collect();
    contents.reprice(&prices)?;
    let totals = contents.totals()?;

    for line in removed {
        if let Some(id) = line.id {
            queries::delete_line(&mut *conn, id).await?;
        }
    }

    let mut rows = Vec::with_capacity(contents.lines().len());
    for line in contents.lines() {
        let row = match line.id {
            Some(id) => queries::update_line(&mut *conn, cart, id, line).await?,
            None => queries::insert_line(&mut *conn, cart, line).await?,
        };
        rows.push(row);
    }

    let cart = queries::update_cart_totals(&mut *conn, cart.id, &totals).await?;
    Ok((cart, rows))
}

/// Lock the owner's open cart, creating an empty one if there is none.
/// Must run inside a transaction.
async fn lock_or_create_cart(conn: &mut PgConnection, owner: &CartOwner) -> Result<Cart> {
    if let Some(cart) = queries::lock_active_cart(&mut *conn, owner).await? {
        return Ok(cart);
    }
    if queries::insert_cart_if_absent(&mut *conn, owner).await? {
        debug!("Created cart for {:?}", owner);
    }
    queries::lock_active_cart(&mut *conn, owner)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("open cart for {:?} changed concurrently", owner)))
}

/// Find the owner's open cart, creating an empty one if there is none
pub async fn get_or_create_cart(pool: &PgPool, owner: &CartOwner) -> Result<Cart> {
    let mut tx = pool.begin().await?;
    let cart = lock_or_create_cart(&mut tx, owner).await?;
    tx.commit().await?;
    Ok(cart)
}

/// The owner's open cart with its products; `None` until the first
/// mutation creates one
pub async fn get_cart_view(pool: &PgPool, owner: &CartOwner) -> Result<Option<CartView>> {
    let Some(cart) = queries::find_active_cart(pool, owner).await? else {
        return Ok(None);
    };
    let mut conn = pool.acquire().await?;
    let lines = queries::get_cart_lines(&mut *conn, cart.id).await?;
    let refs = lines
        .iter()
        .map(CartProduct::reference)
        .collect::<Result<Vec<_>>>()?;
    let products = load_products(&mut conn, refs).await?;
    CartView::assemble(cart, lines, &products).map(Some)
}

/// Add, remove or change the quantity of a product in the owner's cart.
///
/// The product is resolved from `(kind, slug)` first; an unknown pair is
/// `NotFound`. Adding a product already in the cart increases the quantity
/// of its existing line.
pub async fn apply_cart_mutation(
    pool: &PgPool,
    owner: &CartOwner,
    kind: ProductKind,
    slug: &str,
    action: CartAction,
) -> Result<CartView> {
    let mut tx = pool.begin().await?;

    let cart = lock_or_create_cart(&mut tx, owner).await?;
    cart.ensure_open()?;

    let product = db::share_product_by_slug(&mut *tx, kind, slug).await?;
    let target = product.reference();

    let (mut contents, mut products) = load_contents(&mut tx, cart.id).await?;
    products.insert(target, product);

    let removed = contents.apply(&CartMutation::new(target, action))?;
    let (cart, rows) =
        save_contents(&mut tx, &cart, contents, removed.into_iter().collect(), &products).await?;

    tx.commit().await?;

    debug!(
        "Cart {}: {:?} {} {} -> {} products, {}",
        cart.id, action, kind, slug, cart.total_products, cart.total_price
    );
    CartView::assemble(cart, rows, &products)
}

/// Re-save all lines of a locked cart at current prices.
/// Must run inside a transaction.
pub(crate) async fn recalculate_locked(conn: &mut PgConnection, cart_id: i32) -> Result<Cart> {
    let cart = queries::lock_cart(&mut *conn, cart_id).await?;
    cart.ensure_open()?;
    let (contents, products) = load_contents(conn, cart.id).await?;
    let (cart, _) = save_contents(conn, &cart, contents, Vec::new(), &products).await?;
    Ok(cart)
}

/// Bring a cart's line totals and cart totals in line with current prices
pub async fn recalculate_cart(pool: &PgPool, cart_id: i32) -> Result<Cart> {
    let mut tx = pool.begin().await?;
    let cart = recalculate_locked(&mut tx, cart_id).await?;
    tx.commit().await?;
    info!("Recalculated cart {}", cart.id);
    Ok(cart)
}

/// Move an anonymous shopper's cart to a customer.
///
/// The anonymous cart's lines are added into the customer's open cart
/// (created if needed) and the anonymous cart is deleted. Returns `None`
/// if there was nothing to claim.
pub async fn claim_anonymous_cart(
    pool: &PgPool,
    session_key: Uuid,
    customer_id: i32,
) -> Result<Option<Cart>> {
    let mut tx = pool.begin().await?;

    let Some(anonymous) =
        queries::lock_active_cart(&mut *tx, &CartOwner::Anonymous(session_key)).await?
    else {
        return Ok(None);
    };
    let target = lock_or_create_cart(&mut tx, &CartOwner::Customer(customer_id)).await?;

    let (incoming, mut products) = load_contents(&mut tx, anonymous.id).await?;
    let (mut contents, existing) = load_contents(&mut tx, target.id).await?;
    products.extend(existing);
    for line in incoming.lines() {
        contents.apply(&CartMutation::new(line.product, CartAction::Add(line.quantity)))?;
    }
    queries::delete_cart(&mut *tx, anonymous.id).await?;
    let (cart, _) = save_contents(&mut tx, &target, contents, Vec::new(), &products).await?;

    tx.commit().await?;

    info!(
        "Cart {} merged into cart {} of customer {} ({} products)",
        anonymous.id, cart.id, customer_id, cart.total_products
    );
    Ok(Some(cart))
}
