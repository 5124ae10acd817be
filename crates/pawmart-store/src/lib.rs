//! MongoDB access layer for the PawMart marketplace.
//!
//! [`Store`] owns the client and exposes typed handles over the four record
//! collections (`categories`, `listings`, `orders`, `contact`). It is built
//! once at startup, injected into request handlers as shared state, and
//! released explicitly at shutdown.

use futures::TryStreamExt;
use mongodb::{
    Client, Collection,
    bson::{Bson, Document, doc, oid::ObjectId},
    options::{ClientOptions, ServerApi, ServerApiVersion},
};
use tracing::{debug, info};

pub mod error;
pub mod model;
pub mod query;

pub use error::StoreError;
pub use model::{Category, Listing, ListingUpdate, Order};
pub use mongodb::bson;
pub use query::{CATEGORY_ALL, DEFAULT_LIMIT, DEFAULT_PAGE, ListingPage, ListingQuery, SortOrder};

const CATEGORIES: &str = "categories";
const LISTINGS: &str = "listings";
const ORDERS: &str = "orders";
const CONTACT: &str = "contact";

#[derive(Debug, Clone)]
pub struct Store {
    client: Client,
    categories: Collection<Category>,
    listings: Collection<Listing>,
    orders: Collection<Order>,
    contact: Collection<Document>,
}

impl Store {
    /// Connect to the document database. Pins the server to Stable API V1 in
    /// strict mode with deprecation errors, matching how the deployment's
    /// cluster is provisioned.
    pub async fn connect(uri: &str, database: &str, app_name: &str) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some(app_name.to_string());
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );

        let client = Client::with_options(options)?;
        let database = client.database(database);
        info!("Connected store to database '{}'", database.name());

        Ok(Self {
            categories: database.collection(CATEGORIES),
            listings: database.collection(LISTINGS),
            orders: database.collection(ORDERS),
            contact: database.collection(CONTACT),
            client,
        })
    }

    /// Release the client and its connection pool. Called once when the
    /// server has drained.
    pub async fn shutdown(&self) {
        self.client.clone().shutdown().await;
        info!("Store shut down");
    }

    /// Enumerate all categories.
    pub async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.categories.find(Document::new()).await?.try_collect().await?)
    }

    /// Run the listing query engine: count every match, then fetch the
    /// requested page in the requested order.
    ///
    /// The count and the page are separate reads; under concurrent writes
    /// they may observe different snapshots, which is accepted.
    pub async fn find_listings(&self, query: &ListingQuery) -> Result<ListingPage, StoreError> {
        let filter = query.filter_document();
        debug!("Listing filter: {:?}, sort: {:?}", filter, query.sort);

        let total = self.listings.count_documents(filter.clone()).await?;
        let data = self
            .listings
            .find(filter)
            .sort(query.sort.sort_document())
            .skip(query.skip())
            .limit(query.limit)
            .await?
            .try_collect()
            .await?;

        Ok(ListingPage {
            data,
            total,
            page: query.page,
            total_pages: query::total_pages(total, query.limit),
        })
    }

    pub async fn get_listing(&self, id: &str) -> Result<Listing, StoreError> {
        let id = ObjectId::parse_str(id)?;
        self.listings
            .find_one(doc! { "_id": id })
            .await?
            .ok_or(StoreError::NotFound)
    }

    /// Insert the caller-supplied document verbatim and return the generated
    /// id.
    pub async fn insert_listing(&self, listing: Document) -> Result<Bson, StoreError> {
        let result = self
            .listings
            .clone_with_type::<Document>()
            .insert_one(listing)
            .await?;
        Ok(result.inserted_id)
    }

    /// Overwrite the six mutable fields of a listing in one `$set`.
    pub async fn update_listing(&self, id: &str, update: &ListingUpdate) -> Result<(), StoreError> {
        let id = ObjectId::parse_str(id)?;
        let fields = bson::to_document(update)?;
        let result = self
            .listings
            .update_one(doc! { "_id": id }, doc! { "$set": fields })
            .await?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub async fn delete_listing(&self, id: &str) -> Result<u64, StoreError> {
        let id = ObjectId::parse_str(id)?;
        let result = self.listings.delete_one(doc! { "_id": id }).await?;

        if result.deleted_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(result.deleted_count)
    }

    /// Enumerate all orders.
    pub async fn orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.orders.find(Document::new()).await?.try_collect().await?)
    }

    pub async fn insert_order(&self, order: Document) -> Result<Bson, StoreError> {
        let result = self
            .orders
            .clone_with_type::<Document>()
            .insert_one(order)
            .await?;
        Ok(result.inserted_id)
    }

    /// Insert a contact message. Rate limiting happens upstream of this call.
    pub async fn insert_contact(&self, message: Document) -> Result<Bson, StoreError> {
        let result = self.contact.insert_one(message).await?;
        Ok(result.inserted_id)
    }
}
