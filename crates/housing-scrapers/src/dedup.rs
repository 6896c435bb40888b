use housing_core::Listing;
use std::collections::HashSet;

/// Drop repeated candidates, keeping the first occurrence.
///
/// Candidates with a link are keyed by that link and also reserve their
/// lowercased address, so a later link-less copy of the same unit is dropped.
/// Candidates without a link are keyed by lowercased address alone.
pub fn dedup_listings(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen_links: HashSet<String> = HashSet::new();
    let mut seen_addresses: HashSet<String> = HashSet::new();

    listings
        .into_iter()
        .filter(|listing| {
            let address = listing.address.to_lowercase();
            match &listing.listing_link {
                Some(link) => {
                    if !seen_links.insert(link.clone()) {
                        return false;
                    }
                    seen_addresses.insert(address);
                    true
                }
                None => seen_addresses.insert(address),
            }
        })
        .collect()
}
