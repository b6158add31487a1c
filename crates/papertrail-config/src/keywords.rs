//! Built-in relevance vocabulary.
//!
//! Matching is case-insensitive on word boundaries, so "India" also
//! catches "India's" and "INDIA" but not "Indiana".

const KEYWORDS: &[&str] = &[
    // Country and demonyms
    "India", "Indian", "Subcontinent", "South Asia", "South Asian",

    // Institutions
    "RBI", "Reserve Bank of India",
    "SEBI", "Securities and Exchange Board",
    "NSE", "BSE", "National Stock Exchange", "Bombay Stock Exchange",
    "NIPFP", "NCAER",
    "IIM", "IIT", "ISB", "ISI Kolkata", "ISI Delhi",
    "JNU", "DSE", "IGIDR", "CPR", "CSDS",

    // Currency and markets
    "rupee", "rupees", "INR", "Nifty", "Sensex",

    // Cities and states
    "Mumbai", "Delhi", "New Delhi", "Bangalore", "Bengaluru",
    "Chennai", "Hyderabad", "Kolkata", "Pune", "Ahmedabad",
    "Jaipur", "Lucknow", "Kanpur", "Nagpur", "Surat",
    "Maharashtra", "Karnataka", "Tamil Nadu", "Gujarat",
    "Uttar Pradesh", "West Bengal", "Rajasthan", "Kerala",
    "Andhra Pradesh", "Telangana", "Bihar", "Madhya Pradesh",
    "Odisha", "Punjab", "Haryana", "Assam", "Jharkhand",
    "Chhattisgarh", "Uttarakhand", "Goa", "Himachal",

    // Major companies
    "Tata", "Reliance", "Infosys", "Wipro", "TCS",
    "HDFC", "ICICI", "SBI", "Bharti", "Airtel",
    "Mahindra", "Bajaj", "Adani", "Hindustan",
    "Larsen", "L&T", "Maruti", "Hero", "Birla",
    "Vedanta", "Jindal", "Godrej", "ITC",

    // Programmes and policies
    "Mahatma Gandhi", "MGNREGA", "Aadhaar", "UPI",
    "Jan Dhan", "Make in India", "GST", "Demonetization",
    "Digital India", "Swachh Bharat", "PMJDY", "PM-KISAN",
    "Startup India", "Skill India", "Ayushman Bharat",
];

const INSTITUTIONAL_SOURCES: &[&str] = &[
    "RBI", "SEBI", "NIPFP", "NCAER", "EPW", "XKDR",
    "Vikalpa", "IIMB Management Review", "Decision", "IIMK Management Review",
];

pub fn default_keywords() -> Vec<String> {
    KEYWORDS.iter().map(|s| s.to_string()).collect()
}

pub fn default_institutional_sources() -> Vec<String> {
    INSTITUTIONAL_SOURCES.iter().map(|s| s.to_string()).collect()
}
